//! Counter demo - a stateful component rendered through the terminal host.
//!
//! Keys: `+`/`=` increment, `-` decrement, `q` or Ctrl+C quit. Set
//! `RUST_LOG=spindle=debug` to watch pass activations and commits on stderr.

use std::error::Error;
use std::io::Write;
use std::time::Duration;

use crossterm::event::{self, Event as TermEvent, KeyCode, KeyModifiers};
use crossterm::terminal;
use tracing_subscriber::EnvFilter;

use spindle::{
    Attrs, Child, ComponentFn, Element, Engine, Event, EventHandler, TermTree, TimeSlice, Value,
    WorkStatus,
};

fn counter() -> ComponentFn {
    ComponentFn::new(|hooks, _attrs| {
        let (count, set) = hooks.use_state(0i64);

        let inc = set.clone();
        let on_inc = EventHandler::new(move |_| {
            inc.update(|prev| Value::Int(prev.as_int().unwrap_or(0) + 1));
        });
        let dec = set;
        let on_dec = EventHandler::new(move |_| {
            dec.update(|prev| Value::Int(prev.as_int().unwrap_or(0) - 1));
        });

        Element::node(
            "panel",
            Attrs::new().with("title", "spindle counter"),
            [
                Child::from(Element::node(
                    "label",
                    Attrs::new(),
                    [Child::from(format!("count: {}", count.display()))],
                )),
                Child::from(Element::node(
                    "button",
                    Attrs::new().with("id", "inc").with("onClick", on_inc),
                    [Child::from("[+]")],
                )),
                Child::from(Element::node(
                    "button",
                    Attrs::new().with("id", "dec").with("onClick", on_dec),
                    [Child::from("[-]")],
                )),
                Child::from(Element::node(
                    "label",
                    Attrs::new(),
                    [Child::from("press + / - to count, q to quit")],
                )),
            ],
        )
    })
}

fn click(engine: &Engine<TermTree>, id: &str) {
    let target = engine.host().find_by_attr("id", &Value::from(id));
    if let Some(node) = target {
        engine.host_mut().dispatch(node, &Event::new("click"));
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let host = TermTree::new();
    let container = host.root();
    let engine = Engine::new(host);

    engine.render(Element::component(counter(), Attrs::new()), container)?;

    terminal::enable_raw_mode()?;
    let result = run(&engine);
    terminal::disable_raw_mode()?;
    println!();
    result
}

fn run(engine: &Engine<TermTree>) -> Result<(), Box<dyn Error>> {
    loop {
        // Work within a small slice, then hand control to input polling.
        let mut slice = TimeSlice::new(Duration::from_millis(4));
        if engine.tick(&mut slice)? == WorkStatus::Committed {
            engine.host_mut().draw()?;
            std::io::stdout().flush()?;
        }

        if !event::poll(Duration::from_millis(16))? {
            continue;
        }
        if let TermEvent::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(());
                }
                KeyCode::Char('+') | KeyCode::Char('=') => click(engine, "inc"),
                KeyCode::Char('-') => click(engine, "dec"),
                _ => {}
            }
        }
    }
}

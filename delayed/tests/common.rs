#![allow(dead_code)]
use delayed::{models::PayloadFormat, storage::memory::MemoryStore, Config, Delayed};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

lazy_static! {
    /// Every call that reached a receiver, as `Type#method(id)`
    static ref CALLS: Mutex<Vec<String>> = Mutex::new(Vec::default());
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Widget {
    pub id: u64,
    pub name: String,
    pub active: bool,
}

impl Widget {
    pub fn new(id: u64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            active: false,
        }
    }

    fn activate(&mut self) -> anyhow::Result<bool> {
        record_call(format!("Widget#activate({})", self.id));
        self.active = true;
        Ok(self.active)
    }

    fn rename(&mut self, name: String) -> anyhow::Result<String> {
        record_call(format!("Widget#rename({})", self.id));
        self.name = name;
        Ok(self.name.clone())
    }

    fn explode(&mut self) -> anyhow::Result<()> {
        record_call(format!("Widget#explode({})", self.id));
        Err(anyhow::anyhow!("widget {} exploded", self.id))
    }

    fn audit(&mut self) -> anyhow::Result<String> {
        Ok(format!("audited {}", self.id))
    }
}

delayed::performable! {
    struct Widget: record(id) {
        pub fn activate();
        pub fn rename(name: String);
        pub fn explode();
        fn audit();
    }
}

/// A plain value receiver, embedded in full in the payload.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Mailer {
    pub from: String,
}

impl Mailer {
    pub fn deliver(&mut self, to: String, subject: String) -> anyhow::Result<String> {
        record_call(format!("Mailer#deliver({})", to));
        Ok(format!("{} -> {}: {}", self.from, to, subject))
    }
}

delayed::performable! {
    struct Mailer {
        pub fn deliver(to: String, subject: String);
    }
}

/// Parameter names that collide with the names used by the generated dispatch.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Shell {
    pub program: String,
}

impl Shell {
    fn exec(&mut self, args: Vec<String>, method: String, retries: u32) -> anyhow::Result<String> {
        Ok(format!("{} {} [{}] x{}", self.program, args.join(" "), method, retries))
    }
}

delayed::performable! {
    struct Shell {
        pub fn exec(args: Vec<String>, method: String, retries: u32);
    }
}

pub fn record_call(call: String) {
    CALLS.lock().unwrap().push(call);
}

pub fn count_of_calls(call: &str) -> usize {
    CALLS.lock().unwrap().iter().filter(|c| *c == call).count()
}

pub fn create_delayed(store: Arc<MemoryStore>, format: PayloadFormat) -> Delayed {
    Delayed::new(
        Config::builder()
            .name(format!("test-{}", delayed::generate_id()))
            .store(Box::new(store))
            .format(format)
            .build(),
    )
    .register::<Widget>()
    .register::<Mailer>()
    .register::<Shell>()
}

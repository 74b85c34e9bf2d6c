use delayed::{
    models::PayloadFormat, serde_json::json, storage::memory::MemoryStore, Config, Delayed,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Serialize, Deserialize, Debug)]
struct Order {
    id: u64,
    customer: String,
    shipped: bool,
}

impl Order {
    fn ship(&mut self, carrier: String) -> anyhow::Result<String> {
        self.shipped = true;
        tracing::info!("Order {} for {} shipped with {}", self.id, self.customer, carrier);

        Ok(format!("order-{}-{}", self.id, carrier))
    }
}

delayed::performable! {
    struct Order: record(id) {
        pub fn ship(carrier: String);
    }
}

#[derive(Serialize, Deserialize, Debug)]
struct Newsletter {
    issue: u32,
}

impl Newsletter {
    fn publish(&mut self, audience: Vec<String>) -> anyhow::Result<usize> {
        tracing::info!("Newsletter #{} sent to {:?}", self.issue, audience);

        Ok(audience.len())
    }
}

delayed::performable! {
    struct Newsletter {
        pub fn publish(audience: Vec<String>);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let store = Arc::new(MemoryStore::new());
    let delayed = Delayed::new(
        Config::builder()
            .name("example")
            .store(Box::new(store.clone()))
            .format(PayloadFormat::Json)
            .build(),
    )
    .register::<Order>()
    .register::<Newsletter>();

    let order = Order {
        id: 7,
        customer: "ada".to_string(),
        shipped: false,
    };
    store.insert(&order)?;

    // producer side
    let ship = delayed.delay(order, "ship", vec![json!("dhl")])?;
    let publish = delayed.delay(
        Newsletter { issue: 12 },
        "publish",
        vec![json!(["ada@example.com", "grace@example.com"])],
    )?;
    println!(
        "Queued {} ({}): {}",
        ship.id,
        ship.display_name,
        String::from_utf8_lossy(&ship.handler)
    );

    // worker side
    println!("{} -> {:?}", ship.display_name, delayed.run(&ship).await?);
    println!("{} -> {:?}", publish.display_name, delayed.run(&publish).await?);

    // the order is deleted before a second copy of the job runs
    store.remove("Order", &json!(7))?;
    println!("{} -> {:?}", ship.display_name, delayed.run(&ship).await?);

    println!("{}", delayed.get_metrics()?);

    Ok(())
}

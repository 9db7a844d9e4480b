//! Example demonstrating the injector's log output
//!
//! Run with JSON logging (production):
//! ```bash
//! cargo run --example logging --features logging-json
//! ```
//!
//! Run with pretty logging (development):
//! ```bash
//! cargo run --example logging --features logging-pretty
//! ```

use field_injector::{BoxError, Container, Inject};
use std::sync::Arc;

#[derive(Clone, Default)]
struct Database {
    url: String,
}

#[derive(Clone, Default)]
struct Cache {
    size: usize,
}

#[derive(Default, Inject)]
struct RequestHandler {
    #[di("val")]
    db: Option<Box<Database>>,
    #[di("key:cache")]
    cache: Option<Arc<Cache>>,
    #[di("key:tracing")]
    tracing_endpoint: String,
}

fn main() -> Result<(), BoxError> {
    // JSON with logging-json, pretty with logging-pretty, nothing otherwise
    if !field_injector::logging::builder().trace().injector_only().init() {
        println!("(no subscriber installed; enable logging-json or logging-pretty)");
    }

    println!("=== field-injector Logging Demo ===\n");

    let mut handler = RequestHandler::default();

    // logs: "Creating new injection container"
    let container = Container::new();

    // logs: "Registered entry"
    container
        .register_value(Database {
            url: "postgres://localhost/mydb".into(),
        })
        .register_token_shared("cache", Arc::new(Cache { size: 4096 }));

    // logs: "Queued resolution target"
    container.resolve_fields(&mut handler);

    container.after_init(|| {
        println!("  [App] after-init callback");
        Ok::<_, BoxError>(())
    });

    // logs: "Initializing container", "Resolved" per field, "Injection missed"
    // for the unregistered tracing endpoint, then "Container initialized"
    let report = container.init()?;

    println!(
        "\ndb: {:?}, cache: {:?}, misses: {}",
        handler.db.as_ref().map(|db| db.url.as_str()),
        handler.cache.as_ref().map(|cache| cache.size),
        report.misses.len()
    );

    println!("\n=== Demo Complete ===");
    println!("Tip: set RUST_LOG=field_injector=debug to hide per-field events");
    Ok(())
}

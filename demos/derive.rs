//! Example demonstrating #[derive(Inject)] and the three directives
//!
//! Run with:
//!   cargo run --example derive

use field_injector::{BoxError, Container, Inject};
use std::sync::{Arc, Mutex};

trait Storage: Send + Sync {
    fn put(&self, key: &str, value: &str) -> String;
}

#[derive(Clone, Default, Debug)]
struct Database {
    url: String,
}

impl Storage for Database {
    fn put(&self, key: &str, value: &str) -> String {
        format!("{} <- {key}={value}", self.url)
    }
}

#[allow(dead_code)]
#[derive(Clone, Default, Debug)]
struct Limits {
    max_connections: u32,
    timeout_ms: u64,
}

#[derive(Default, Inject)]
struct UserService {
    // Shares the registered implementation
    #[di("api")]
    storage: Option<Arc<dyn Storage>>,
    // Allocated, then filled with a private copy
    #[di("val")]
    limits: Option<Box<Limits>>,
    // Whatever was registered under the token
    #[di("key:region")]
    region: String,
    // Nothing registered under this token: left as it was
    #[di("key:feature-flags")]
    flags: Option<Arc<Vec<String>>>,
    // Not a directive: skipped
    #[di("inject")]
    audit: Option<Arc<Database>>,
    request_count: u64,
}

impl UserService {
    fn describe(&self) -> String {
        let storage = match &self.storage {
            Some(storage) => storage.put("user:1", "alice"),
            None => "no storage".into(),
        };
        format!(
            "{storage}\n  limits: {:?}\n  region: {}\n  flags: {:?}\n  audit: {:?}\n  requests: {}",
            self.limits, self.region, self.flags, self.audit, self.request_count
        )
    }
}

fn main() -> Result<(), BoxError> {
    println!("=== field-injector Derive Demo ===\n");

    let mut users = UserService::default();
    let reports = Arc::new(Mutex::new(UserService::default()));

    let container = Container::new();
    container
        .register_api::<dyn Storage>(Arc::new(Database {
            url: "postgres://localhost:5432/myapp".into(),
        }))
        .register_value(Limits {
            max_connections: 16,
            timeout_ms: 2_000,
        })
        .register_token("region", String::from("eu-west-1"))
        .resolve_fields(&mut users)
        .resolve_fields_shared(Arc::clone(&reports));

    {
        let reports = Arc::clone(&reports);
        container.after_init(move || -> Result<(), BoxError> {
            let reports = reports.lock().map_err(|_| "reports lock poisoned")?;
            println!("after-init: reports region is {}", reports.region);
            Ok(())
        });
    }

    println!("Queued {} targets, {} registrations", container.pending(), container.len());

    let report = container.init()?;

    println!("\nUserService:\n  {}", users.describe());
    println!(
        "\nresolved {}, skipped {}, missed {}, callbacks {}",
        report.resolved,
        report.skipped,
        report.misses.len(),
        report.callbacks
    );
    for miss in &report.misses {
        println!("  miss: {miss}");
    }

    Ok(())
}

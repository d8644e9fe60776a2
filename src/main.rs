#![forbid(unsafe_code)]

use std::sync::Arc;
use std::time::Duration;

use lazy_static::lazy_static;
use log::{error, info};
use poem::{listener::TcpListener, Route};
use poem_openapi::OpenApiService;
use tokio::signal;
use tokio::sync::watch;

// Greeting Server Utilities
use crate::utils::config::{init_log, init_runtime_context, RuntimeCtx, GREETING_ARGS, GREETING_DIRS};
use crate::utils::errors::Errors;
use crate::utils::heartbeat::HeartbeatTask;
use crate::utils::store::GreetingStore;
use crate::v1::greeting::greeting_get::GetGreetingApi;
use crate::v1::greeting::greeting_update::UpdateGreetingApi;

// Modules
mod utils;
mod v1;

// ***************************************************************************
//                                Constants
// ***************************************************************************
const SERVER_NAME : &str = "GreetingServer"; // for poem logging

// How long in-flight requests may run after a shutdown signal arrives.
const SHUTDOWN_TIMEOUT_SECS : u64 = 10;

// ***************************************************************************
//                             Static Variables
// ***************************************************************************
// Lazily initialize the parameters variable so that is has a 'static lifetime.
// We exit if we can't read our parameters.
lazy_static! {
    static ref RUNTIME_CTX: RuntimeCtx = init_runtime_context();
}

// ---------------------------------------------------------------------------
// main:
// ---------------------------------------------------------------------------
#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    // --------------- Initialize Server --------------
    // Announce ourselves.
    println!("Starting greeting_server!");

    // Honor the create-dirs-only flag before full initialization; touching
    // the directory statics creates anything that's missing.
    if GREETING_ARGS.create_dirs_only {
        println!("Data directories created under {}.", GREETING_DIRS.root_dir);
        return Ok(());
    }

    // Initialize the server.
    greeting_init();

    // --------------- Main Loop Set Up ---------------
    // Assign base URL.
    let greeting_url = format!("{}:{}",
        RUNTIME_CTX.parms.config.http_addr,
        RUNTIME_CTX.parms.config.http_port);

    // Build the one store instance and hand it to each endpoint.
    let store = Arc::new(GreetingStore::new(&RUNTIME_CTX.parms.config.default_greeting));

    // Create a tuple with the greeting endpoint structs.
    let endpoints = (GetGreetingApi::new(store.clone()), UpdateGreetingApi::new(store));
    let api_service =
        OpenApiService::new(endpoints, RUNTIME_CTX.parms.config.title.clone(), "0.1.0")
            .server(greeting_url);

    // Allow the generated openapi specs to be retrieved from the server.
    let spec = api_service.spec_endpoint();
    let spec_yaml = api_service.spec_endpoint_yaml();

    // Create the routes.
    let addr = format!("{}{}", "0.0.0.0:", RUNTIME_CTX.parms.config.http_port);
    let ui = api_service.swagger_ui();
    let app = Route::new()
        .nest("/", api_service)
        .nest("/ui", ui)
        .at("/spec", spec)
        .at("/spec_yaml", spec_yaml);

    // Start the heartbeat task with its cancellation channel.
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let heartbeat = tokio::spawn(HeartbeatTask::new().run(cancel_rx));

    // ------------------ Main Loop -------------------
    let result = poem::Server::new(TcpListener::bind(addr))
        .name(SERVER_NAME)
        .run_with_graceful_shutdown(
            app,
            shutdown_signal(),
            Some(Duration::from_secs(SHUTDOWN_TIMEOUT_SECS)),
        )
        .await;

    // ------------------ Shutdown --------------------
    // Cancel the heartbeat and wait for it to finish before exiting.
    let _ = cancel_tx.send(true);
    if let Err(e) = heartbeat.await {
        error!("{}", Errors::GreetingError(format!("Heartbeat task failed: {}", e)));
    }
    info!("Greeting server shutdown complete.");

    result
}

// ***************************************************************************
//                             Private Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// greeting_init:
// ---------------------------------------------------------------------------
/** Initialize all subsystems and data structures other than those needed
 * to configure the main loop processor.
 */
fn greeting_init() {
    // Configure our log.
    init_log();

    // Force the reading of input parameters and initialization of runtime context.
    info!("{}", Errors::InputParms(format!("{:#?}", *RUNTIME_CTX)));

    // Log build info.
    print_version_info();
}

// ---------------------------------------------------------------------------
// print_version_info:
// ---------------------------------------------------------------------------
fn print_version_info() {
    // Log build info.
    info!("{}.", format!("\n*** Running GreetingServer={}, BRANCH={}, COMMIT={}, DIRTY={}, SRC_TS={}, RUSTC={}",
                        option_env!("CARGO_PKG_VERSION").unwrap_or("unknown"),
                        env!("GIT_BRANCH"),
                        env!("GIT_COMMIT_SHORT"),
                        env!("GIT_DIRTY"),
                        env!("SOURCE_TIMESTAMP"),
                        env!("RUSTC_VERSION")),
    );
}

// ---------------------------------------------------------------------------
// shutdown_signal:
// ---------------------------------------------------------------------------
/** Resolve when the process is asked to stop (Ctrl+C or SIGTERM). */
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C signal handler");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM signal handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received.");
}

use docket_api::setup;
use docket_core::Config;

// mimalloc as the global allocator: lower fragmentation under many
// concurrent multipart uploads, especially on musl-based images.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    // Keeps the state alive for the workers, which only hold a weak reference.
    let (state, router) = setup::initialize_app(config.clone()).await?;

    setup::server::start_server(&config, router, state.tasks.task_queue.clone()).await?;

    Ok(())
}

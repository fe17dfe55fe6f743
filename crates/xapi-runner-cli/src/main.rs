//! Entrypoint for the `xapi-runner` binary.

#[tokio::main]
async fn main() {
    let code = xapi_runner_cli::run().await;
    if code != 0 {
        std::process::exit(code);
    }
}

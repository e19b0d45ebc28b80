use clap::Parser;
use redkv::server::{self, Config, DEFAULT_HOST, DEFAULT_MAX_FRAME_SIZE, DEFAULT_PORT};
use redkv::Error;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// The address to bind to
    #[arg(long, env = "REDKV_HOST", default_value = DEFAULT_HOST)]
    host: String,

    /// The port to listen on
    #[arg(short, long, env = "REDKV_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Maximum number of bytes buffered for a single incomplete request
    #[arg(long, env = "REDKV_MAX_FRAME_SIZE", default_value_t = DEFAULT_MAX_FRAME_SIZE)]
    max_frame_size: usize,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Config {
            host: args.host,
            port: args.port,
            max_frame_size: args.max_frame_size,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Args::parse();

    server::run(args.into()).await
}

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use url::Url;

use rewrite_proxy::config::FetchConfig;
use rewrite_proxy::fetch::{classify, decode_html, ContentClass, ContentFetcher};
use rewrite_proxy::rewrite::{BaseOrigin, Document, RewriteEngine, UrlResolver, DEFAULT_PROXY_PATH};

#[derive(Parser)]
#[command(name = "rewrite-cli")]
#[command(about = "Run the proxy's URL rewriting without starting a server", long_about = None)]
struct Cli {
    /// Path prefix used for proxied URLs
    #[arg(short, long, default_value = DEFAULT_PROXY_PATH)]
    proxy_path: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite a local HTML file as if it had been fetched from --base
    File {
        path: PathBuf,
        #[arg(short, long)]
        base: Url,
    },
    /// Fetch a URL and print the rewritten document (or a passthrough summary)
    Fetch { url: Url },
    /// Resolve a single reference against --base
    Resolve {
        reference: String,
        #[arg(short, long)]
        base: Url,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let engine = RewriteEngine::new(UrlResolver::new(cli.proxy_path));

    match cli.command {
        Commands::File { path, base } => {
            let mut document = Document::from_bytes(std::fs::read(&path)?);
            engine.rewrite(&mut document, &BaseOrigin::new(base));
            std::io::stdout().write_all(document.as_bytes())?;
        }
        Commands::Fetch { url } => {
            let fetcher = ContentFetcher::new(&FetchConfig::default())?;
            let content = fetcher.fetch(&url).await?;
            match classify(&content.media_type) {
                ContentClass::Html => {
                    let base = BaseOrigin::new(content.final_url);
                    let mut document =
                        Document::from_bytes(decode_html(content.body, &content.media_type));
                    engine.rewrite(&mut document, &base);
                    std::io::stdout().write_all(document.as_bytes())?;
                }
                ContentClass::Opaque => {
                    let media_type = if content.media_type.is_empty() {
                        "<no content-type>"
                    } else {
                        content.media_type.as_str()
                    };
                    println!(
                        "{} {} ({} bytes, passthrough)",
                        content.status,
                        media_type,
                        content.body.len()
                    );
                }
            }
        }
        Commands::Resolve { reference, base } => {
            let base = BaseOrigin::new(base);
            eprintln!("resolving against {}", base.url());
            println!("{}", engine.resolver().resolve(&reference, &base));
        }
    }

    Ok(())
}

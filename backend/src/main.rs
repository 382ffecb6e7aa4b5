//! Artify CLI - pin content, mint coins, browse the marketplace
//!
//! # Main Commands
//!
//! ```bash
//! artify serve                                  # Start the pinning proxy (port 3000)
//! artify submit image --name .. --description .. --image cover.png
//! artify mint --wallet 0x.. --metadata-uri ipfs://.. --name ..
//! artify market --wallet 0x.. --filter music    # Browse coins
//! ```
//!
//! # Other Commands
//!
//! ```bash
//! artify pin-file cover.png        # Upload one file through the proxy
//! artify pin-json metadata.json    # Upload one JSON document
//! artify tokens --creator 0x..     # List recorded coins
//! artify buy 0xcoin 0.01           # Trade a coin
//! artify session set 0x..          # Remember the connected wallet
//! artify reset                     # Drop all local records
//! ```

use artify::{
    filter_items, market_summary, AppConfig, Asset, ContentDraft, ContentStore, ContentType,
    FileBackend, JsonRpcReader, MarketItem, Marketplace, MintInput, MintOutcome, Minter, PinningClient,
    RawDraft, RelayIssuer, SessionStore, SubmissionWorkflow, TokenRepository, TradeDesk, ZoraCoinsClient,
};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

type CliResult = Result<(), Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "artify")]
#[command(about = "Tokenize creator content as tradable coins", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the pinning proxy server
    Serve {
        /// Port to listen on (default: PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Upload a file through the proxy
    PinFile {
        /// File to pin
        path: PathBuf,
    },

    /// Upload a JSON document through the proxy
    PinJson {
        /// JSON file to pin
        path: PathBuf,
    },

    /// Validate a draft and pin its content and metadata
    Submit {
        /// Content type: image, blog, video, music, code
        content_type: ContentType,

        #[arg(long)]
        name: String,

        #[arg(long)]
        description: String,

        /// Cover image (image content)
        #[arg(long)]
        image: Option<PathBuf>,

        /// Media file (video, music)
        #[arg(long)]
        file: Option<PathBuf>,

        /// Repository link (code)
        #[arg(long)]
        link: Option<String>,

        /// Article URL (blog)
        #[arg(long)]
        url: Option<String>,
    },

    /// Deploy a coin for pinned metadata and record it
    Mint {
        /// Creator wallet (default: session user)
        #[arg(short, long)]
        wallet: Option<String>,

        #[arg(long)]
        metadata_uri: String,

        #[arg(long)]
        name: String,

        /// Ticker (derived from the name if omitted)
        #[arg(long)]
        symbol: Option<String>,

        #[arg(long = "type", default_value = "image")]
        content_type: ContentType,

        #[arg(long, default_value = "")]
        image_uri: String,

        #[arg(long, default_value = "")]
        description: String,
    },

    /// List recorded coins
    Tokens {
        /// Only coins of this creator
        #[arg(short, long)]
        creator: Option<String>,
    },

    /// Browse the marketplace
    Market {
        /// Include coins held by this wallet (default: session user)
        #[arg(short, long)]
        wallet: Option<String>,

        /// `all` or a content type
        #[arg(short, long, default_value = "all")]
        filter: String,

        /// Search titles and creators
        #[arg(short, long, default_value = "")]
        search: String,
    },

    /// Buy a coin with ETH
    Buy {
        /// Coin contract address
        coin: String,
        /// ETH to spend
        eth: String,
        #[arg(short, long)]
        wallet: Option<String>,
    },

    /// Sell a coin
    Sell {
        /// Coin contract address
        coin: String,
        /// Amount of coin to sell
        amount: String,
        #[arg(short, long)]
        wallet: Option<String>,
    },

    /// Manage the connected wallet
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Delete all local records and the session
    Reset,
}

#[derive(Subcommand)]
enum SessionAction {
    /// Remember a wallet address
    Set { wallet: String },
    /// Show the remembered wallet
    Show,
    /// Forget the remembered wallet
    Clear,
}

fn init_logging() {
    const DEFAULT_LOG_FILTER: &str = "info";

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env();
    init_logging();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { port } => cmd_serve(config, port).await,
        Commands::PinFile { path } => cmd_pin_file(&config, &path).await,
        Commands::PinJson { path } => cmd_pin_json(&config, &path).await,
        Commands::Submit {
            content_type,
            name,
            description,
            image,
            file,
            link,
            url,
        } => {
            let raw = RawDraftArgs { name, description, image, file, link, url };
            cmd_submit(&config, content_type, raw).await
        }
        Commands::Mint {
            wallet,
            metadata_uri,
            name,
            symbol,
            content_type,
            image_uri,
            description,
        } => {
            let input = MintInput {
                name,
                symbol,
                description,
                content_type,
                image_uri,
                metadata_uri,
            };
            cmd_mint(&config, wallet, input).await
        }
        Commands::Tokens { creator } => cmd_tokens(&config, creator.as_deref()),
        Commands::Market { wallet, filter, search } => cmd_market(&config, wallet, &filter, &search).await,
        Commands::Buy { coin, eth, wallet } => cmd_trade(&config, Trade::Buy, &coin, &eth, wallet).await,
        Commands::Sell { coin, amount, wallet } => cmd_trade(&config, Trade::Sell, &coin, &amount, wallet).await,
        Commands::Session { action } => cmd_session(&config, action),
        Commands::Reset => cmd_reset(&config),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn read_asset(path: &Path) -> Result<Asset, Box<dyn Error>> {
    let bytes = fs::read(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload".to_string());
    Ok(Asset::from_path_bytes(file_name, bytes))
}

fn backend(config: &AppConfig) -> Arc<FileBackend> {
    Arc::new(FileBackend::new(&config.data_dir))
}

fn repository(config: &AppConfig) -> TokenRepository<FileBackend> {
    TokenRepository::new(backend(config))
}

/// Explicit wallet, else the session user.
fn resolve_wallet(config: &AppConfig, wallet: Option<String>) -> Result<String, Box<dyn Error>> {
    if let Some(wallet) = wallet.filter(|w| !w.trim().is_empty()) {
        return Ok(wallet);
    }
    SessionStore::new(backend(config))
        .session_user()?
        .ok_or_else(|| "No wallet given and no session user (run `artify session set <wallet>`)".into())
}

fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// =============================================================================
// Commands
// =============================================================================

async fn cmd_serve(mut config: AppConfig, port: Option<u16>) -> CliResult {
    if let Some(port) = port {
        config.port = port;
    }
    artify::server::start_server(&config).await?;
    Ok(())
}

async fn cmd_pin_file(config: &AppConfig, path: &Path) -> CliResult {
    eprintln!("📤 Pinning file: {}", path.display());
    let asset = read_asset(path)?;
    let client = PinningClient::new(&config.proxy_url);
    let cid = client.upload_file(&asset).await?;

    eprintln!("✅ Pinned");
    println!("{}", cid.to_uri());
    eprintln!("   Gateway: {}", cid.gateway_url(&config.pinata_gateway));
    Ok(())
}

async fn cmd_pin_json(config: &AppConfig, path: &Path) -> CliResult {
    eprintln!("📤 Pinning JSON: {}", path.display());
    let document: Value = serde_json::from_str(&fs::read_to_string(path)?)?;
    let client = PinningClient::new(&config.proxy_url);
    let cid = client.upload_json(&document).await?;

    eprintln!("✅ Pinned");
    println!("{}", cid.to_uri());
    Ok(())
}

struct RawDraftArgs {
    name: String,
    description: String,
    image: Option<PathBuf>,
    file: Option<PathBuf>,
    link: Option<String>,
    url: Option<String>,
}

async fn cmd_submit(config: &AppConfig, content_type: ContentType, args: RawDraftArgs) -> CliResult {
    let raw = RawDraft {
        name: args.name,
        description: args.description,
        image: args.image.as_deref().map(read_asset).transpose()?,
        file: args.file.as_deref().map(read_asset).transpose()?,
        link: args.link,
        url: args.url,
    };
    let draft = ContentDraft::from_raw(content_type, raw);
    eprintln!("{} Submitting {}: {}", content_type.icon(), content_type.label(), draft.name());

    let mut workflow = SubmissionWorkflow::new(Arc::new(PinningClient::new(&config.proxy_url)));
    let uploaded = workflow.submit(&draft).await?;

    eprintln!("✅ Ready to mint");
    print_json(&uploaded)
}

async fn cmd_mint(config: &AppConfig, wallet: Option<String>, input: MintInput) -> CliResult {
    let wallet = resolve_wallet(config, wallet)?;
    eprintln!("🪙 Minting \"{}\" for {}", input.name, wallet);

    let minter = Minter::new(Arc::new(RelayIssuer::new(&config.issuer_url)), repository(config))
        .with_chain_id(config.chain_id);

    match minter.mint(&input, &wallet).await? {
        MintOutcome::Confirmed { tx_hash, address } => {
            eprintln!("✅ Coin deployed");
            println!("tx: {}", tx_hash);
            if let Some(address) = address {
                println!("address: {}", address);
            }
            Ok(())
        }
        MintOutcome::Pending { tx_hash } => {
            eprintln!("⏳ Transaction submitted but not yet confirmed");
            if let Some(tx_hash) = tx_hash {
                println!("tx: {}", tx_hash);
            }
            Ok(())
        }
        MintOutcome::Failed { message } => Err(message.into()),
    }
}

fn cmd_tokens(config: &AppConfig, creator: Option<&str>) -> CliResult {
    let repository = repository(config);
    let tokens = match creator {
        Some(creator) => repository.tokens_by_creator(creator)?,
        None => repository.all_tokens()?,
    };

    eprintln!("📦 {} coin(s)", tokens.len());
    print_json(&tokens)
}

async fn load_market(config: &AppConfig, wallet: Option<&str>) -> Result<Vec<MarketItem>, Box<dyn Error>> {
    let stats = Arc::new(ZoraCoinsClient::new(&config.zora_api_url, config.chain_id));
    let market = Marketplace::new(stats, repository(config), &config.pinata_gateway);
    Ok(market.load(wallet).await?)
}

async fn cmd_market(config: &AppConfig, wallet: Option<String>, filter: &str, search: &str) -> CliResult {
    let wallet = match wallet {
        Some(wallet) => Some(wallet),
        None => SessionStore::new(backend(config)).session_user()?,
    };

    let items = load_market(config, wallet.as_deref()).await?;
    let shown = filter_items(&items, filter, search);

    if shown.is_empty() {
        eprintln!("🔍 No content found");
    }
    for item in &shown {
        eprintln!(
            "{} {} (${}) by {} - {} - supply {} - {} holders",
            item.type_icon, item.title, item.symbol, item.creator, item.price, item.supply, item.sales
        );
    }

    let summary = market_summary(&items);
    eprintln!(
        "\n📊 {} coins, {} creators, {} holders, {:.4} ETH 24h volume",
        summary.coins_listed, summary.creators, summary.total_holders, summary.total_volume
    );
    print_json(&shown)
}

enum Trade {
    Buy,
    Sell,
}

async fn cmd_trade(config: &AppConfig, trade: Trade, coin: &str, amount: &str, wallet: Option<String>) -> CliResult {
    let wallet = resolve_wallet(config, wallet)?;
    let items = load_market(config, Some(&wallet)).await?;
    let item = items
        .into_iter()
        .find(|i| i.contract_address.eq_ignore_ascii_case(coin))
        .unwrap_or_else(|| MarketItem {
            id: coin.to_string(),
            contract_address: coin.to_string(),
            symbol: coin.to_string(),
            ..MarketItem::default()
        });

    let desk = TradeDesk::new(
        Arc::new(RelayIssuer::new(&config.issuer_url)),
        Arc::new(JsonRpcReader::new(&config.rpc_url)),
    )
    .with_chain_id(config.chain_id);

    let receipt = match trade {
        Trade::Buy => desk.buy(&item, amount, &wallet).await?,
        Trade::Sell => desk.sell(&item, amount, &wallet).await?,
    };

    eprintln!("✅ Trade confirmed");
    println!("tx: {}", receipt.tx_hash);
    Ok(())
}

fn cmd_session(config: &AppConfig, action: SessionAction) -> CliResult {
    let session = SessionStore::new(backend(config));
    match action {
        SessionAction::Set { wallet } => {
            session.set_session_user(&wallet)?;
            eprintln!("🔗 Session user set to {}", wallet);
        }
        SessionAction::Show => match session.session_user()? {
            Some(wallet) => println!("{}", wallet),
            None => eprintln!("No session user"),
        },
        SessionAction::Clear => {
            session.clear_session_user()?;
            eprintln!("🔌 Session cleared");
        }
    }
    Ok(())
}

fn cmd_reset(config: &AppConfig) -> CliResult {
    repository(config).clear_all()?;
    eprintln!("🗑️  Local records cleared");
    Ok(())
}

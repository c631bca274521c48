use clap::{Parser, Subcommand};
use paveviz::catalog::{FeedClient, Product, ProductCatalog, ProductCategory};
use paveviz::config::{self, AppConfig};
use paveviz::generation::{GeminiClient, GenerativeModel};
use paveviz::imaging::ingest;
use paveviz::output;
use paveviz::report;
use paveviz::session::Session;
use std::path::{Path, PathBuf};
use tracing::{Level, info, warn};

#[derive(Parser)]
#[command(name = "paveviz")]
#[command(about = "Visualize paving products on a photo of your site")]
#[command(long_about = "\
Visualize paving products on a photo of your site

Pick a product from the catalog, and paveviz re-paves the ground in your
photo with it using an image generation model. Follow-up instructions
refine the result; every refinement starts again from the original photo.

Typical session:

  paveviz products --category stone
  paveviz visualize --site garden.jpg --product \"Indian Sandstone\" \\
      --refine \"add a low wall along the left edge\" \\
      --refine \"make the joints darker\"

The API key is read from the environment variable named in the config
(API_KEY by default). Run 'paveviz gen-config' to generate a documented
paveviz.toml.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = config::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    /// More log output on stderr (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List catalog products
    Products {
        /// Only list this category (porcelain, stone, clay)
        #[arg(long)]
        category: Option<ProductCategory>,
    },
    /// Generate a visualization, apply refinements, and export the results
    Visualize(VisualizeArgs),
    /// Print a stock paveviz.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct VisualizeArgs {
    /// Photo of the site to pave
    #[arg(long)]
    site: PathBuf,

    /// Product name or file id
    #[arg(long)]
    product: String,

    /// Restrict the product lookup to this category
    #[arg(long)]
    category: Option<ProductCategory>,

    /// Refinement instruction, applied in order (repeatable)
    #[arg(long)]
    refine: Vec<String>,

    /// Mask image for the first refinement (white = area to change)
    #[arg(long)]
    mask: Option<PathBuf>,

    /// Output directory for images and reports
    #[arg(long, default_value = "paveviz-out")]
    out: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Products { category } => {
            let config = config::load_config(&cli.config)?;
            let products = FeedClient::new(&config.catalog.feed_url)
                .list_products()
                .await?;
            output::print_products(&products, category);
        }
        Command::Visualize(args) => {
            let config = config::load_config(&cli.config)?;
            run_visualize(&config, args).await?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

async fn run_visualize(
    config: &AppConfig,
    args: VisualizeArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let api_key = config.generation.api_key()?;
    let mut session = Session::new(
        FeedClient::new(&config.catalog.feed_url),
        GeminiClient::new(&config.generation.api_base, &api_key),
        config,
    );

    session.load_site_image(&args.site)?;
    session.load_products().await;
    if let Some(error) = session.state().catalog_error() {
        return Err(error.into());
    }

    let product = find_product(session.state().products(), &args.product, args.category)
        .ok_or_else(|| format!("no product matches '{}'", args.product))?
        .clone();
    session.state_mut().set_category(product.category);
    if !session.select_product(&product).await {
        return Err(session
            .state()
            .error()
            .unwrap_or("no paving selected")
            .into());
    }

    session.visualize().await?;
    if let Some(error) = session.state().error() {
        output::print_session(session.state());
        return Err(error.into());
    }
    session.state_mut().save_current_to_gallery();

    if let Some(mask_path) = &args.mask {
        session.set_mask(Some(ingest::load_file(mask_path)?))?;
    }
    for instruction in &args.refine {
        session.refine(instruction).await?;
        if session.state().error().is_some() {
            warn!(instruction = %instruction, "refinement failed, keeping previous result");
            break;
        }
        session.state_mut().save_current_to_gallery();
    }

    output::print_session(session.state());
    let written = export(&session, config, &args.out)?;
    let paths: Vec<&Path> = written.iter().map(PathBuf::as_path).collect();
    output::print_written(&paths);
    Ok(())
}

/// Match by file id first, then by case-insensitive name.
fn find_product<'a>(
    products: &'a [Product],
    query: &str,
    category: Option<ProductCategory>,
) -> Option<&'a Product> {
    let query = query.trim();
    let candidates = || {
        products
            .iter()
            .filter(move |p| category.is_none_or(|c| p.category == c))
    };
    candidates()
        .find(|p| p.file_id == query)
        .or_else(|| candidates().find(|p| p.name.eq_ignore_ascii_case(query)))
}

/// Write every saved image, the PDF report and the HTML gallery to `out`.
fn export<C, M>(
    session: &Session<C, M>,
    config: &AppConfig,
    out: &Path,
) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>>
where
    C: ProductCatalog,
    M: GenerativeModel,
{
    std::fs::create_dir_all(out)?;
    let gallery = session.state().gallery();
    let mut written = Vec::with_capacity(gallery.len() + 2);

    for entry in gallery {
        let path = out.join(report::download_file_name(entry));
        std::fs::write(&path, entry.generated_image.bytes()?)?;
        written.push(path);
    }

    let pdf_path = out.join(&config.report.file_name);
    session.export_report(&pdf_path)?;
    written.push(pdf_path);

    let html_path = out.join("gallery.html");
    std::fs::write(&html_path, report::render_html(gallery, &config.report.title))?;
    written.push(html_path);

    info!(dir = %out.display(), files = written.len(), "export complete");
    Ok(written)
}

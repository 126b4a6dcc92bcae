use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    str::FromStr,
    sync::Arc,
};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use clap::{ArgAction, Args, Parser, Subcommand};
use inventory_admin::{
    config::{self, AppConfig, StoreBackend},
    models::{InventoryRecord, ProductId},
    screen::{
        ActionOutcome, AutoConfirm, ConfirmPrompt, Confirmer, InventoryScreen, ListAction,
        ProductField, RowView,
    },
    services::RawImage,
    AppState,
};
use serde::Serialize;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load_config().context("failed to load application config")?;
    config::init_tracing(config.log_level(), config.log_json);
    require_persistent_store(&config)?;
    let state = AppState::from_config(config).context("failed to initialise store")?;

    match cli.command {
        Commands::List(args) => handle_list(&state, args, cli.json).await,
        Commands::Show(args) => handle_show(&state, args, cli.json).await,
        Commands::Add(args) => handle_add(&state, args, cli.json).await,
        Commands::Edit(args) => handle_edit(&state, args, cli.json).await,
        Commands::Archive(args) => handle_archive(&state, args, true).await,
        Commands::Unarchive(args) => handle_archive(&state, args, false).await,
        Commands::Delete(args) => handle_delete(&state, args).await,
    }
}

#[derive(Parser)]
#[command(name = "inventory-cli", about = "Manage the product inventory", version)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON when available"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products, non-archived first
    List(ListArgs),
    /// Show one product
    Show(IdArgs),
    /// Create a product
    Add(AddArgs),
    /// Overwrite fields of an existing product
    Edit(EditArgs),
    /// Archive a product
    Archive(ConfirmArgs),
    /// Unarchive a product
    Unarchive(ConfirmArgs),
    /// Delete a product and its image
    Delete(ConfirmArgs),
}

#[derive(Args)]
struct ListArgs {
    #[arg(long, short, help = "Case-insensitive search over name and description")]
    query: Option<String>,
}

#[derive(Args)]
struct IdArgs {
    #[arg(help = "Product identifier")]
    id: String,
}

#[derive(Args)]
struct AddArgs {
    #[arg(
        long = "field",
        value_parser = parse_field_assignment,
        help = "Field assignment, e.g. --field productName=\"Widget A\" (repeatable)"
    )]
    fields: Vec<(ProductField, String)>,
    #[arg(long, help = "Path to the product photo (required)")]
    image: Option<PathBuf>,
}

#[derive(Args)]
struct EditArgs {
    #[arg(help = "Product identifier")]
    id: String,
    #[arg(
        long = "field",
        value_parser = parse_field_assignment,
        help = "Field assignment to change (repeatable)"
    )]
    fields: Vec<(ProductField, String)>,
    #[arg(long, help = "Replacement photo; the stored one is kept otherwise")]
    image: Option<PathBuf>,
}

#[derive(Args)]
struct ConfirmArgs {
    #[arg(help = "Product identifier")]
    id: String,
    #[arg(long, short, action = ArgAction::SetTrue, help = "Skip the confirmation prompt")]
    yes: bool,
}

/// Asks on the terminal and waits for the answer off the async runtime.
struct TerminalConfirmer;

#[async_trait]
impl Confirmer for TerminalConfirmer {
    async fn confirm(&self, prompt: ConfirmPrompt) -> bool {
        let message = prompt.message();
        let answer = tokio::task::spawn_blocking(move || -> io::Result<String> {
            let mut stdout = io::stdout();
            write!(stdout, "{message} [y/N] ")?;
            stdout.flush()?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            Ok(line)
        })
        .await;

        match answer {
            Ok(Ok(line)) => matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Ok(Err(e)) => {
                debug!(error = %e, "could not read confirmation");
                false
            }
            Err(e) => {
                debug!(error = %e, "confirmation task failed");
                false
            }
        }
    }
}

fn screen(state: &AppState, skip_prompt: bool) -> InventoryScreen {
    let confirmer: Arc<dyn Confirmer> = if skip_prompt {
        Arc::new(AutoConfirm(true))
    } else {
        Arc::new(TerminalConfirmer)
    };
    InventoryScreen::new(state.repository.clone(), state.preprocessor.clone(), confirmer)
}

async fn handle_list(state: &AppState, args: ListArgs, json: bool) -> Result<()> {
    let mut screen = screen(state, false);
    screen.set_query(args.query.unwrap_or_default());
    screen.load().await;
    let list = screen.snapshot().list;

    if json {
        return print_json(&list.rows);
    }
    if list.rows.is_empty() {
        println!("No products found.");
    }
    for row in &list.rows {
        render_row(row);
    }
    Ok(())
}

async fn handle_show(state: &AppState, args: IdArgs, json: bool) -> Result<()> {
    let id = ProductId::parse(args.id)?;
    let record = state
        .repository
        .find(&id)
        .await?
        .ok_or_else(|| anyhow!("product {id} not found"))?;

    if json {
        print_json(&record)
    } else {
        render_record(&record);
        Ok(())
    }
}

async fn handle_add(state: &AppState, args: AddArgs, json: bool) -> Result<()> {
    let mut screen = screen(state, true);
    for (field, value) in args.fields {
        screen.set_field(field, value);
    }
    submit(&mut screen, args.image, json).await
}

async fn handle_edit(state: &AppState, args: EditArgs, json: bool) -> Result<()> {
    let id = ProductId::parse(args.id)?;
    let mut screen = screen(state, true);
    screen.dispatch(ListAction::Edit(id)).await?;
    for (field, value) in args.fields {
        screen.set_field(field, value);
    }
    submit(&mut screen, args.image, json).await
}

async fn handle_archive(state: &AppState, args: ConfirmArgs, archived: bool) -> Result<()> {
    let id = ProductId::parse(args.id)?;
    let mut screen = screen(state, args.yes);
    screen.load().await;

    let current = screen
        .list()
        .find(&id)
        .ok_or_else(|| anyhow!("product {id} not found"))?;
    if current.is_archived() == archived {
        println!(
            "Product {id} is already {}.",
            if archived { "archived" } else { "active" }
        );
        return Ok(());
    }

    let outcome = screen
        .dispatch(ListAction::ToggleArchive(id.clone()))
        .await
        .map_err(|e| report(&screen, e))?;
    match outcome {
        ActionOutcome::Applied if archived => println!("Product {id} archived."),
        ActionOutcome::Applied => println!("Product {id} unarchived."),
        ActionOutcome::Declined => println!("Cancelled."),
    }
    Ok(())
}

async fn handle_delete(state: &AppState, args: ConfirmArgs) -> Result<()> {
    let id = ProductId::parse(args.id)?;
    let mut screen = screen(state, args.yes);

    let outcome = screen
        .dispatch(ListAction::Delete(id.clone()))
        .await
        .map_err(|e| report(&screen, e))?;
    match outcome {
        ActionOutcome::Applied => println!("Product {id} deleted."),
        ActionOutcome::Declined => println!("Cancelled."),
    }
    Ok(())
}

async fn submit(screen: &mut InventoryScreen, image: Option<PathBuf>, json: bool) -> Result<()> {
    if let Some(path) = image {
        let raw = RawImage::from_path(&path).await?;
        screen
            .select_image(Some(raw))
            .await
            .with_context(|| format!("failed to process {}", path.display()))?;
    }

    let id = match screen.submit().await {
        Ok(id) => id,
        Err(e) => {
            for error in &screen.snapshot().form.errors {
                eprintln!("  {}: {}", error.field, error.message);
            }
            return Err(report(screen, e));
        }
    };

    if json {
        #[derive(Serialize)]
        struct Submitted<'a> {
            id: &'a ProductId,
            message: Option<&'a str>,
        }
        print_json(&Submitted {
            id: &id,
            message: screen.notice().map(|notice| notice.message.as_str()),
        })
    } else {
        if let Some(notice) = screen.notice() {
            println!("{}", notice.message);
        }
        println!("Product id: {id}");
        Ok(())
    }
}

/// Prefers the screen's notice text over the raw error.
fn report(screen: &InventoryScreen, err: inventory_admin::errors::ServiceError) -> anyhow::Error {
    match screen.notice() {
        Some(notice) => anyhow::Error::new(err).context(notice.message.clone()),
        None => err.into(),
    }
}

/// Each CLI run is its own process, so an in-memory store would forget every write.
fn require_persistent_store(config: &AppConfig) -> Result<()> {
    match config.store_backend {
        StoreBackend::Rest => Ok(()),
        StoreBackend::Memory => Err(anyhow!(
            "the in-memory store does not outlive a single command; \
             set APP__STORE_BACKEND=rest and APP__DATABASE_URL to use inventory-cli"
        )),
    }
}

fn parse_field_assignment(raw: &str) -> Result<(ProductField, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("invalid field '{raw}', expected name=value"))?;
    let field = ProductField::from_str(key.trim())
        .map_err(|_| format!("unknown field '{}'", key.trim()))?;
    Ok((field, value.trim().to_string()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_row(row: &RowView) {
    let product = &row.record.product;
    println!(
        "- {} • {} • MRP {} • stock {} • {} • {}",
        row.record.id(),
        product.product_name,
        product.mrp,
        product.stock_total,
        row.image_label.unwrap_or("Image"),
        if row.record.is_archived() { "archived" } else { "active" }
    );
}

fn render_record(record: &InventoryRecord) {
    let product = &record.product;
    println!("Product {}", record.id());
    println!("  Name:            {}", product.product_name);
    println!("  Category:        {}", product.category);
    println!("  Brand:           {}", product.brand);
    println!("  Description:     {}", product.description);
    println!("  MRP:             {}", product.mrp);
    println!("  Purchase price:  {}", product.purchase_price);
    println!("  Retail price:    {}", product.retail_sell_price);
    println!("  Wholesale price: {}", product.wholesale_sell_price);
    println!("  Discount:        {}", product.discount);
    println!("  Stock:           {}", product.stock_total);
    println!("  Rank:            {}", product.rank);
    println!("  Total sale:      {}", product.total_sale);
    println!("  Archived:        {}", product.archive);
    match &record.image {
        Some(image) => println!("  Image:           {} bytes (data URL)", image.len()),
        None => println!("  Image:           No Image"),
    }
}

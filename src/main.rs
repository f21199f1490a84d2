//! Command-line interface for xsdtree

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand, ValueEnum};

#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "cli")]
use xsdtree::limits::Limits;
#[cfg(feature = "cli")]
use xsdtree::nodes::XmlNode;
#[cfg(feature = "cli")]
use xsdtree::session::{LoadedSchema, NodeView};
#[cfg(feature = "cli")]
use xsdtree::views::render_text;
#[cfg(feature = "cli")]
use xsdtree::Session;

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "xsdtree")]
#[command(author, version, about = "Browse the element hierarchy of an XSD schema", long_about = None)]
struct Cli {
    /// Resource limits applied while loading
    #[arg(long, value_enum, default_value_t = LimitsPreset::Default, global = true)]
    limits: LimitsPreset,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum LimitsPreset {
    Default,
    Strict,
    Permissive,
}

#[cfg(feature = "cli")]
impl From<LimitsPreset> for Limits {
    fn from(preset: LimitsPreset) -> Self {
        match preset {
            LimitsPreset::Default => Limits::default(),
            LimitsPreset::Strict => Limits::strict(),
            LimitsPreset::Permissive => Limits::permissive(),
        }
    }
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// List the root element declarations of a schema
    Roots {
        /// Path to the .xsd or .xml file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the element hierarchy as a tree
    Tree {
        /// Path to the .xsd or .xml file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Start from this element instead of every root
        #[arg(short, long)]
        element: Option<String>,

        /// Maximum number of levels below the starting elements
        #[arg(short, long, default_value_t = 8)]
        depth: usize,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show details of one element declaration
    Show {
        /// Path to the .xsd or .xml file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Element to show (defaults to the first root)
        #[arg(short, long)]
        element: Option<String>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

#[cfg(feature = "cli")]
fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut session = Session::new().with_limits(cli.limits.into());

    let result = match cli.command {
        Commands::Roots { file, json } => cmd_roots(&mut session, file, json),
        Commands::Tree {
            file,
            element,
            depth,
            json,
        } => cmd_tree(&mut session, file, element, depth, json),
        Commands::Show {
            file,
            element,
            json,
        } => cmd_show(&mut session, file, element, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn load(
    session: &mut Session,
    file: PathBuf,
    json: bool,
) -> Result<&mut LoadedSchema, Box<dyn std::error::Error>> {
    let loaded = session.load_file(&file)?;
    if !json {
        println!(
            "Loaded {} ({})",
            loaded.source().name,
            loaded.source().formatted_size()
        );
        println!();
    }
    Ok(loaded)
}

#[cfg(feature = "cli")]
fn cmd_roots(
    session: &mut Session,
    file: PathBuf,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = load(session, file, json)?;
    let roots = loaded.root_views();

    if json {
        println!("{}", serde_json::to_string_pretty(&roots)?);
        return Ok(());
    }

    println!("=== Root Elements ===");
    for view in &roots {
        let marker = if view.has_children { " [+]" } else { "" };
        println!("  {} : {}{}", view.label(), view.badge(), marker);
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_tree(
    session: &mut Session,
    file: PathBuf,
    element: Option<String>,
    depth: usize,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = load(session, file, json)?;

    let trees = match element {
        Some(name) => {
            let id = loaded.find(&name)?.node().id();
            vec![loaded.subtree(id, depth)?]
        }
        None => loaded.tree(depth),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&trees)?);
    } else {
        print!("{}", render_text(&trees));
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_show(
    session: &mut Session,
    file: PathBuf,
    element: Option<String>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = load(session, file, json)?;

    let id = match element {
        Some(name) => loaded.find(&name)?.node().id(),
        None => loaded
            .root_views()
            .first()
            .map(|root| root.id)
            .ok_or(xsdtree::Error::NoRootElement)?,
    };
    let view = loaded.view(id)?;
    let children = loaded.expand(id)?.to_vec();

    if json {
        let output = serde_json::json!({
            "element": view,
            "children": children,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_element_details(&view, &children);
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn print_element_details(view: &NodeView, children: &[NodeView]) {
    println!("Element: {}", view.name);
    println!("  Type: {}", view.badge());
    println!("  Optional: {}", view.optional);
    if view.is_reference {
        println!("  Reference: yes");
    }

    if !view.attributes.is_empty() {
        println!();
        println!("Attributes:");
        for (name, value) in &view.attributes {
            println!("  {}: {}", name, value);
        }
    }

    if let Some(doc) = &view.documentation {
        println!();
        println!("Documentation:");
        println!("  {}", doc);
    }

    if !children.is_empty() {
        println!();
        println!("Children:");
        for child in children {
            let marker = if child.has_children { " [+]" } else { "" };
            println!("  {} : {}{}", child.label(), child.badge(), marker);
        }
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}

use anyhow::{bail, Context};
use colored::Colorize;
use pys_sdk::{Address, AncestorRef, AnyBackend, Backend, StoreConfig, TypeName};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(&cli)?;
    let backend = AnyBackend::open(&config)
        .with_context(|| format!("cannot open {} store at {}", config.backend, config.path.display()))?;

    match cli.command {
        Command::Ls(args) => cmd_ls(&backend, args),
        Command::Show(args) => cmd_show(&backend, args),
        Command::Rm(args) => cmd_rm(&backend, args),
        Command::Tree => cmd_tree(&backend),
        Command::Destroy(args) => cmd_destroy(backend, args),
    }
}

/// Config file (or defaults), then command-line overrides.
fn resolve_config(cli: &Cli) -> anyhow::Result<StoreConfig> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::from_file(path)?,
        None => StoreConfig::default(),
    };
    if let Some(backend) = cli.backend {
        config.backend = backend.into();
    }
    if let Some(path) = &cli.path {
        config.path = path.clone();
    }
    if cli.lock_timeout_ms.is_some() {
        config.lock_timeout_ms = cli.lock_timeout_ms;
    }
    Ok(config)
}

/// Parse `Type/id/Type/id...` into a chain of keyed ancestors.
fn parse_chain(chain: Option<&str>) -> anyhow::Result<Vec<AncestorRef<'static>>> {
    let Some(chain) = chain.filter(|c| !c.is_empty()) else {
        return Ok(Vec::new());
    };
    let address: Address = chain
        .parse()
        .with_context(|| format!("bad parent chain {chain:?}"))?;
    Ok(keys(address.segments()))
}

fn keys(segments: &[(TypeName, pys_sdk::Identifier)]) -> Vec<AncestorRef<'static>> {
    segments
        .iter()
        .map(|(t, id)| AncestorRef::named(t.clone(), id.clone()))
        .collect()
}

/// Split an address into the ancestors of its last segment.
fn parse_address(address: &str) -> anyhow::Result<(Address, Vec<AncestorRef<'static>>)> {
    let parsed: Address = address
        .parse()
        .with_context(|| format!("bad address {address:?}"))?;
    let segments = parsed.segments();
    let ancestors = keys(&segments[..segments.len() - 1]);
    Ok((parsed, ancestors))
}

fn render_payload(data: &[u8], pretty: bool) -> String {
    match serde_json::from_slice::<serde_json::Value>(data) {
        Ok(value) if pretty => serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string()),
        Ok(value) => value.to_string(),
        Err(_) => String::from_utf8_lossy(data).into_owned(),
    }
}

fn cmd_ls(backend: &AnyBackend, args: LsArgs) -> anyhow::Result<()> {
    let type_name = TypeName::new(args.type_name)?;
    let ancestors = parse_chain(args.under.as_deref())?;
    let entries = backend.scan(&type_name, &ancestors)?;
    if entries.is_empty() {
        println!("No {} records.", type_name.as_str().bold());
        return Ok(());
    }
    for (id, data) in &entries {
        println!("{}  {}", id.as_str().yellow(), render_payload(data, false));
    }
    println!("{} {} record(s) in {}", "✓".green(), entries.len(), backend.describe().dimmed());
    Ok(())
}

fn cmd_show(backend: &AnyBackend, args: ShowArgs) -> anyhow::Result<()> {
    let (address, ancestors) = parse_address(&args.address)?;
    match backend.get(address.type_name(), address.id(), &ancestors)? {
        Some(data) => {
            println!("{}", address.to_string().yellow().bold());
            println!("{}", render_payload(&data, true));
        }
        None => println!("{} not found", address.to_string().yellow()),
    }
    Ok(())
}

fn cmd_rm(backend: &AnyBackend, args: RmArgs) -> anyhow::Result<()> {
    let (address, ancestors) = parse_address(&args.address)?;
    backend.remove(address.type_name(), address.id(), &ancestors)?;
    println!("{} Removed {}", "✓".green(), address.to_string().yellow());
    Ok(())
}

fn cmd_tree(backend: &AnyBackend) -> anyhow::Result<()> {
    let addresses = match backend {
        AnyBackend::File(file) => file.addresses()?,
        AnyBackend::Memory(memory) => memory.addresses(),
        AnyBackend::Sqlite(sqlite) => {
            // Rows only know their immediate parent, so there is no tree to
            // rebuild; show the tables instead.
            for table in sqlite.tables()? {
                println!("{} {}", "table".dimmed(), table.bold());
            }
            return Ok(());
        }
    };
    for address in &addresses {
        let indent = "  ".repeat(address.depth() - 1);
        println!("{indent}{}", address.to_string().yellow());
    }
    println!("{} {} address(es)", "✓".green(), addresses.len());
    Ok(())
}

fn cmd_destroy(backend: AnyBackend, args: DestroyArgs) -> anyhow::Result<()> {
    if !args.yes {
        bail!("refusing to destroy {} without --yes", backend.describe());
    }
    let description = backend.describe();
    backend.destroy()?;
    println!("{} Destroyed {}", "✓".green().bold(), description);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pys_sdk::{BackendKind, Identifier};

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pys").chain(args.iter().copied())).unwrap()
    }

    // -----------------------------------------------------------------------
    // Config resolution
    // -----------------------------------------------------------------------

    #[test]
    fn defaults_without_flags() {
        let config = resolve_config(&parse(&["tree"])).unwrap();
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("pys.toml");
        std::fs::write(&file, "backend = \"sqlite\"\npath = \"a.db\"\nlock_timeout_ms = 5\n").unwrap();
        let file_arg = file.to_str().unwrap();

        let config = resolve_config(&parse(&["--config", file_arg, "--backend", "file", "tree"])).unwrap();
        assert_eq!(config.backend, BackendKind::File);
        assert_eq!(config.path, std::path::PathBuf::from("a.db"));
        assert_eq!(config.lock_timeout_ms, Some(5));
    }

    #[test]
    fn missing_config_file_is_an_error() {
        assert!(resolve_config(&parse(&["--config", "/nonexistent/pys.toml", "tree"])).is_err());
    }

    // -----------------------------------------------------------------------
    // Address parsing
    // -----------------------------------------------------------------------

    #[test]
    fn parent_chain_becomes_keys() {
        let chain = parse_chain(Some("Author/leo/Book/b1")).unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].type_name().as_str(), "Author");
        assert_eq!(chain[1].id().as_str(), "b1");
        assert!(parse_chain(None).unwrap().is_empty());
        assert!(parse_chain(Some("Author")).is_err());
    }

    #[test]
    fn address_splits_into_record_and_parents() {
        let (address, ancestors) = parse_address("Author/leo/Book/b1").unwrap();
        assert_eq!(address.id(), &Identifier::new("b1").unwrap());
        assert_eq!(ancestors.len(), 1);
        assert_eq!(ancestors[0].id().as_str(), "leo");
    }

    #[test]
    fn payload_rendering() {
        assert_eq!(render_payload(br#"{"a": 1}"#, false), r#"{"a":1}"#);
        assert!(render_payload(br#"{"a":1}"#, true).contains('\n'));
        assert_eq!(render_payload(b"plain", true), "plain");
    }

    // -----------------------------------------------------------------------
    // Commands against a real store
    // -----------------------------------------------------------------------

    #[test]
    fn rm_and_destroy_on_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("store");
        let base_arg = base.to_str().unwrap();

        let config = StoreConfig::new(BackendKind::File, &base);
        let backend = AnyBackend::open(&config).unwrap();
        let author = TypeName::new("Author").unwrap();
        let book = TypeName::new("Book").unwrap();
        let leo = Identifier::new("leo").unwrap();
        backend.put(&author, &leo, br#"{"name":"Leo"}"#, &[]).unwrap();
        backend
            .put(&book, &Identifier::new("b1").unwrap(), b"{}", &parse_chain(Some("Author/leo")).unwrap())
            .unwrap();

        run_command(parse(&["--backend", "file", "--path", base_arg, "ls", "Book", "--under", "Author/leo"])).unwrap();
        run_command(parse(&["--backend", "file", "--path", base_arg, "show", "Author/leo"])).unwrap();
        run_command(parse(&["--backend", "file", "--path", base_arg, "tree"])).unwrap();
        run_command(parse(&["--backend", "file", "--path", base_arg, "rm", "Author/leo/Book/b1"])).unwrap();
        assert!(backend
            .get(&book, &Identifier::new("b1").unwrap(), &parse_chain(Some("Author/leo")).unwrap())
            .unwrap()
            .is_none());

        assert!(run_command(parse(&["--backend", "file", "--path", base_arg, "destroy"])).is_err());
        assert!(base.exists());
        run_command(parse(&["--backend", "file", "--path", base_arg, "destroy", "--yes"])).unwrap();
        assert!(!base.exists());
    }
}

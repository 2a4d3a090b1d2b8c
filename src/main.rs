use anyhow::Result;
use std::io::{self, IsTerminal};
use std::time::Instant;
use wiki_visualizer::{
    cli::{Cli, Commands},
    config::{load_dotenv, ServerSettings},
    logging::init_tracing,
    paths::resolve_database_path,
    run_import,
    schema::DependencyResolver,
    web, LogUi, Phase, SilentUi, SqliteWriter, UiApp,
};

fn main() -> Result<()> {
    load_dotenv();
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Serve {
            database,
            fetch,
            host,
            port,
            secret,
        } => {
            init_tracing("info")?;
            let settings = ServerSettings::new(
                host,
                port,
                secret,
                resolve_database_path(database.path)?,
                fetch.settings(),
            )?;
            actix_web::rt::System::new().block_on(web::run(settings))?;
        }

        Commands::Import {
            database,
            fetch,
            quiet,
        } => {
            let start = Instant::now();
            let db_path = resolve_database_path(database.path)?;
            let settings = fetch.settings();

            let summary = if quiet {
                init_tracing("warn")?;
                run_import(&settings, &db_path, &mut SilentUi::new())?
            } else if io::stdout().is_terminal() {
                // The terminal UI owns the screen, so no log subscriber here
                let mut ui = UiApp::new()?;
                match run_import(&settings, &db_path, &mut ui) {
                    Ok(summary) => {
                        ui.finish(Phase::Complete, &summary.to_string())?;
                        summary
                    }
                    Err(err) => {
                        ui.finish(Phase::Failed, &format!("Error: {:#}", err))?;
                        return Err(err);
                    }
                }
            } else {
                init_tracing("info")?;
                run_import(&settings, &db_path, &mut LogUi)?
            };

            println!(
                "{} into {:?} in {:.1}s",
                summary,
                db_path,
                start.elapsed().as_secs_f64()
            );
        }

        Commands::InitDb { database } => {
            init_tracing("info")?;
            let db_path = resolve_database_path(database.path)?;
            SqliteWriter::reset(&db_path)?;
            println!("Created empty database at {:?}", db_path);
        }

        Commands::ListTables => {
            println!("Tables in creation order:\n");
            let tables = DependencyResolver::new()
                .creation_order()
                .map_err(anyhow::Error::msg)?;
            for table in tables {
                println!("  {} ({} columns)", table.name, table.columns.len());
            }
        }
    }

    Ok(())
}

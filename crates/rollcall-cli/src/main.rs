use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use rollcall_hw::Camera;
use rollcall_store::Store;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod config;
mod engine;
mod monitor;
mod register;
mod report;

use config::Config;
use register::RegistrationForm;

#[derive(Parser, Debug)]
#[command(name = "rollcall", about = "Webcam face-recognition attendance tracker")]
struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/rollcall/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register an employee and capture their face
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        designation: String,
    },
    /// Watch the camera and record check-ins and check-outs
    Monitor,
    /// Show attendance history
    Logs {
        /// Only this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
    /// Manage registered staff
    Staff {
        #[command(subcommand)]
        command: StaffCommand,
    },
    /// Show total staff and present counts
    Stats {
        /// Day to count (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
    /// List V4L2 capture devices
    Devices,
}

#[derive(Subcommand, Debug)]
enum StaffCommand {
    /// List registered employees
    List {
        #[arg(long)]
        json: bool,
    },
    /// Save an employee's registration photo as JPEG
    Photo {
        name: String,
        /// Output file
        out: PathBuf,
    },
    /// Delete an employee and their attendance history
    Remove {
        name: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    if let Commands::Devices = cli.command {
        let devices = Camera::list_devices();
        if devices.is_empty() {
            println!("No video capture devices found");
        }
        for d in devices {
            println!("{}  {} ({}, {})", d.path, d.name, d.driver, d.bus);
        }
        return Ok(());
    }

    let store = Store::open(&config.db_path)
        .with_context(|| format!("opening database {}", config.db_path.display()))?;

    match cli.command {
        Commands::Register {
            name,
            email,
            phone,
            designation,
        } => {
            let form = RegistrationForm {
                name,
                email,
                phone,
                designation,
            };
            println!("Look at the camera...");
            let id = register::register(&store, &config, form).context("registration failed")?;
            println!("Registration complete (id {id})");
        }
        Commands::Monitor => monitor::run(&store, &config).await?,
        Commands::Logs { date, json } => {
            let records = match date {
                Some(d) => store.records_on(d)?,
                None => store.all_records()?,
            };
            if json {
                report::print_json(&records)?;
            } else {
                print!("{}", report::attendance_table(&records));
            }
        }
        Commands::Staff { command } => match command {
            StaffCommand::List { json } => {
                let staff = store.list_employees()?;
                if json {
                    report::print_json(&staff)?;
                } else {
                    print!("{}", report::staff_table(&staff));
                }
            }
            StaffCommand::Photo { name, out } => {
                let jpeg = store.employee_image(&name)?;
                std::fs::write(&out, &jpeg)
                    .with_context(|| format!("writing {}", out.display()))?;
                println!("Saved {name}'s photo to {} ({} bytes)", out.display(), jpeg.len());
            }
            StaffCommand::Remove { name, yes } => {
                if !yes && !confirm(&format!("Delete {name} and their attendance history?"))? {
                    println!("Cancelled");
                    return Ok(());
                }
                store.remove_employee(&name)?;
                println!("Removed {name}");
                report::print_stats(&store.daily_stats(Local::now().date_naive())?);
            }
        },
        Commands::Stats { date, json } => {
            let stats = store.daily_stats(date.unwrap_or_else(|| Local::now().date_naive()))?;
            if json {
                report::print_json(&stats)?;
            } else {
                report::print_stats(&stats);
            }
        }
        Commands::Devices => {}
    }

    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_register() {
        let cli = Cli::try_parse_from([
            "rollcall", "register", "--name", "Alice", "--email", "a@x.io",
            "--phone", "100", "--designation", "Engineer",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Register { ref name, .. } if name == "Alice"));
    }

    #[test]
    fn test_parse_logs_date() {
        let cli = Cli::try_parse_from(["rollcall", "logs", "--date", "2026-03-02", "--json"]).unwrap();
        match cli.command {
            Commands::Logs { date, json } => {
                assert_eq!(date, NaiveDate::from_ymd_opt(2026, 3, 2));
                assert!(json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_date() {
        assert!(Cli::try_parse_from(["rollcall", "logs", "--date", "03/02/2026"]).is_err());
    }

    #[test]
    fn test_parse_staff_photo() {
        let cli = Cli::try_parse_from(["rollcall", "staff", "photo", "Alice", "alice.jpg"]).unwrap();
        match cli.command {
            Commands::Staff { command: StaffCommand::Photo { name, out } } => {
                assert_eq!(name, "Alice");
                assert_eq!(out, PathBuf::from("alice.jpg"));
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(Cli::try_parse_from(["rollcall", "staff", "photo", "Alice"]).is_err());
    }

    #[test]
    fn test_parse_staff_remove_with_global_config() {
        let cli = Cli::try_parse_from(["rollcall", "staff", "remove", "Alice", "-y", "--config", "/etc/rollcall.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/rollcall.toml")));
        assert!(matches!(cli.command, Commands::Staff { command: StaffCommand::Remove { yes: true, .. } }));
    }
}

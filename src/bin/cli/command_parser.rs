use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, Command};

pub fn arg_parser() -> Command {
    Command::new("techtest")
        .about("Author and article CRUD service")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("FILE")
                .help("Configuration file [default: config.toml]")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .subcommand(
            Command::new("serve")
                .about("Apply pending migrations and serve the http api")
                .arg(
                    Arg::new("no-migrate")
                        .long("no-migrate")
                        .help("Serve without touching the schema")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("migrate").about("Apply pending migrations"))
        .subcommand(Command::new("showmigrations").about("List migrations and whether they are applied"))
        .subcommand(Command::new("config").about("Print the default configuration"))
        .subcommand(Command::new("dump").about("Print every record as json"))
        .subcommand(
            Command::new("load")
                .about("Fill an empty database from a dump")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
}

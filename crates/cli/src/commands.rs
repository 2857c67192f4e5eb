//! Clap command tree definition.

use clap::{value_parser, Arg, ArgAction, Command};

/// Build the complete CLI command tree.
pub fn build_cli() -> Command {
    Command::new("vigil")
        .about("Shared CCTV safety-violation record store")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("store")
                .long("store")
                .help("Store file (overrides [store] path in the config)")
                .global(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Config file (default: ./vigil.toml if present)")
                .global(true),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("JSON output mode")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("More logging (-v debug, -vv trace); VIGIL_LOG overrides")
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand(build_init())
        .subcommand(build_list())
        .subcommand(build_add())
        .subcommand(build_update())
        .subcommand(build_delete())
        .subcommand(build_resolve())
        .subcommand(build_status())
        .subcommand(build_demo())
        .subcommand(build_watch())
}

fn build_init() -> Command {
    Command::new("init").about("Create the store and a default vigil.toml if missing")
}

fn build_list() -> Command {
    Command::new("list")
        .about("List violation records")
        .arg(Arg::new("type").long("type").help("Only this violation type"))
        .arg(Arg::new("area").long("area").help("Only this factory area"))
        .arg(
            Arg::new("section")
                .long("section")
                .help("Only this inspection section"),
        )
        .arg(
            Arg::new("unresolved")
                .long("unresolved")
                .help("Only unresolved records")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("sort")
                .long("sort")
                .help("Display order")
                .value_parser(["stored", "newest", "oldest"])
                .default_value("stored"),
        )
}

fn field_args(cmd: Command, required: bool) -> Command {
    cmd.arg(
        Arg::new("timestamp")
            .long("timestamp")
            .help("MM/DD/YY HH:MM AM|PM"),
    )
    .arg(
        Arg::new("area")
            .long("area")
            .help("Factory area")
            .required(required),
    )
    .arg(
        Arg::new("section")
            .long("section")
            .help("Inspection section")
            .required(required),
    )
    .arg(
        Arg::new("type")
            .long("type")
            .help("Violation type")
            .required(required),
    )
    .arg(
        Arg::new("image-url")
            .long("image-url")
            .help("Evidence image or clip reference"),
    )
}

fn build_add() -> Command {
    field_args(
        Command::new("add").about("Record a new violation (timestamp defaults to now)"),
        true,
    )
    .arg(
        Arg::new("resolved")
            .long("resolved")
            .help("Record as already resolved")
            .action(ArgAction::SetTrue),
    )
    .arg(
        Arg::new("confirmed")
            .long("confirmed")
            .help("Record as confirmed")
            .action(ArgAction::SetTrue),
    )
}

fn build_update() -> Command {
    field_args(
        Command::new("update")
            .about("Change fields of the record at a position")
            .arg(
                Arg::new("position")
                    .required(true)
                    .value_parser(value_parser!(usize))
                    .help("0-based position from `list`"),
            ),
        false,
    )
    .arg(
        Arg::new("resolved")
            .long("resolved")
            .value_parser(value_parser!(bool))
            .help("true or false"),
    )
    .arg(
        Arg::new("confirmed")
            .long("confirmed")
            .value_parser(value_parser!(bool))
            .help("true or false"),
    )
}

fn build_delete() -> Command {
    Command::new("delete")
        .about("Delete the record at a position")
        .arg(
            Arg::new("position")
                .required(true)
                .value_parser(value_parser!(usize))
                .help("0-based position from `list`"),
        )
}

fn build_resolve() -> Command {
    Command::new("resolve")
        .about("Mark a record resolved")
        .arg(
            Arg::new("target")
                .required(true)
                .help("Position from `list`, or a record id"),
        )
}

fn build_status() -> Command {
    Command::new("status").about("Show record counts and resolution rate")
}

fn build_demo() -> Command {
    Command::new("demo").about("Insert an example violation stamped now")
}

fn build_watch() -> Command {
    Command::new("watch")
        .about("Print change events until interrupted")
        .arg(
            Arg::new("alerts-only")
                .long("alerts-only")
                .help("Only new unresolved violations")
                .action(ArgAction::SetTrue),
        )
}

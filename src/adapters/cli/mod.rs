pub mod commands;
pub mod render;

pub use commands::CliContext;

use clap::{value_parser, Arg, ArgAction, Command};

fn page_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("page")
                .long("page")
                .value_name("N")
                .help("Page number, starting at 1")
                .value_parser(value_parser!(usize))
                .default_value("1"),
        )
        .arg(
            Arg::new("per_page")
                .long("per-page")
                .value_name("N")
                .help("Rows per page (defaults to page_size from config)")
                .value_parser(value_parser!(usize)),
        )
}

fn client_args(command: Command, required: bool) -> Command {
    command
        .arg(
            Arg::new("name")
                .long("name")
                .value_name("FULL_NAME")
                .help("Client full name")
                .required(required),
        )
        .arg(
            Arg::new("type")
                .long("type")
                .value_name("individual|brand")
                .help("Client type")
                .required(required),
        )
        .arg(
            Arg::new("email")
                .long("email")
                .value_name("EMAIL")
                .help("Client email")
                .required(required),
        )
        .arg(
            Arg::new("phone")
                .long("phone")
                .value_name("PHONE")
                .help("Client phone number")
                .required(required),
        )
        .arg(Arg::new("company").long("company").value_name("COMPANY"))
        .arg(Arg::new("address").long("address").value_name("ADDRESS"))
        .arg(
            Arg::new("contact_name")
                .long("contact-name")
                .value_name("NAME")
                .help("Point of contact at the client"),
        )
        .arg(
            Arg::new("contact_role")
                .long("contact-role")
                .value_name("ROLE"),
        )
}

pub fn build_cli() -> Command {
    Command::new("creator-desk")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Projects, clients and invoices for freelancers and content creators")
        .long_about("A terminal client for the creator business backend.\n\nRun without a subcommand to open the project wizard.\nSign in first with `creator-desk login`.")
        .arg(
            Arg::new("api_url")
                .long("api-url")
                .value_name("URL")
                .help("Backend base URL (can also be set via CREATOR_DESK_API_URL env var)")
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Write debug output to creator-desk.log")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("login")
                .about("Sign in and remember the session")
                .arg(
                    Arg::new("email")
                        .long("email")
                        .value_name("EMAIL")
                        .required(true),
                )
                .arg(
                    Arg::new("password")
                        .long("password")
                        .value_name("PASSWORD")
                        .help("Prompted for when omitted"),
                ),
        )
        .subcommand(
            Command::new("signup")
                .about("Create an account")
                .arg(
                    Arg::new("name")
                        .long("name")
                        .value_name("FULL_NAME")
                        .required(true),
                )
                .arg(
                    Arg::new("email")
                        .long("email")
                        .value_name("EMAIL")
                        .required(true),
                )
                .arg(
                    Arg::new("password")
                        .long("password")
                        .value_name("PASSWORD")
                        .help("Prompted for when omitted"),
                ),
        )
        .subcommand(Command::new("logout").about("Forget the stored session"))
        .subcommand(Command::new("whoami").about("Show the signed-in user"))
        .subcommand(
            Command::new("wizard")
                .about("Create a project step by step (default)")
                .arg(
                    Arg::new("draft")
                        .long("draft")
                        .value_name("DRAFT_ID")
                        .help("Continue a saved draft"),
                ),
        )
        .subcommand(
            Command::new("projects")
                .about("Project operations")
                .subcommand_required(true)
                .subcommand(
                    page_args(Command::new("list").about("List projects, newest first"))
                        .arg(
                            Arg::new("drafts")
                                .long("drafts")
                                .help("List saved drafts instead")
                                .action(ArgAction::SetTrue),
                        )
                        .arg(
                            Arg::new("status")
                                .long("status")
                                .value_name("STATUS")
                                .help("Only projects with this status"),
                        )
                        .arg(
                            Arg::new("search")
                                .long("search")
                                .short('s')
                                .value_name("QUERY")
                                .help("Match name, type or tags"),
                        )
                        .arg(
                            Arg::new("refresh")
                                .long("refresh")
                                .help("Skip the list cache")
                                .action(ArgAction::SetTrue),
                        )
                        .arg(
                            Arg::new("json")
                                .long("json")
                                .help("Print JSON instead of a table")
                                .action(ArgAction::SetTrue),
                        ),
                )
                .subcommand(
                    Command::new("get")
                        .about("Show a project")
                        .arg(
                            Arg::new("project_id")
                                .help("Project ID")
                                .required(true)
                                .index(1),
                        )
                        .arg(
                            Arg::new("draft")
                                .long("draft")
                                .help("The ID belongs to a draft")
                                .action(ArgAction::SetTrue),
                        ),
                )
                .subcommand(
                    Command::new("tag")
                        .about("Add or remove a tag")
                        .arg(
                            Arg::new("project_id")
                                .help("Project ID")
                                .required(true)
                                .index(1),
                        )
                        .arg(Arg::new("add").long("add").value_name("TAG"))
                        .arg(Arg::new("remove").long("remove").value_name("TAG"))
                        .group(
                            clap::ArgGroup::new("tag_change")
                                .args(["add", "remove"])
                                .required(true),
                        ),
                )
                .subcommand(
                    Command::new("status")
                        .about("Change a project's status")
                        .arg(
                            Arg::new("project_id")
                                .help("Project ID")
                                .required(true)
                                .index(1),
                        )
                        .arg(
                            Arg::new("status")
                                .help("New status, e.g. \"Project Started\"")
                                .required(true)
                                .index(2),
                        ),
                )
                .subcommand(
                    Command::new("upload")
                        .about("Upload pictures and print their URLs")
                        .arg(
                            Arg::new("files")
                                .help("Image files")
                                .required(true)
                                .num_args(1..)
                                .value_parser(value_parser!(std::path::PathBuf)),
                        ),
                ),
        )
        .subcommand(
            Command::new("clients")
                .about("Client operations")
                .subcommand_required(true)
                .subcommand(page_args(Command::new("list").about("List clients")))
                .subcommand(
                    Command::new("get")
                        .about("Show a client")
                        .arg(
                            Arg::new("client_id")
                                .help("Client ID")
                                .required(true)
                                .index(1),
                        ),
                )
                .subcommand(client_args(
                    Command::new("create").about("Add a client"),
                    true,
                ))
                .subcommand(client_args(
                    Command::new("update").about("Edit a client").arg(
                        Arg::new("client_id")
                            .help("Client ID")
                            .required(true)
                            .index(1),
                    ),
                    false,
                )),
        )
        .subcommand(
            Command::new("invoice")
                .about("Print an invoice, standalone or for a project")
                .arg(
                    Arg::new("project")
                        .long("project")
                        .value_name("PROJECT_ID")
                        .help("Bill a project"),
                )
                .arg(
                    Arg::new("select")
                        .long("select")
                        .value_name("MILESTONE|MONTH")
                        .help("Milestone name or contract month to bill (repeatable)")
                        .action(ArgAction::Append)
                        .requires("project"),
                )
                .arg(
                    Arg::new("amount")
                        .long("amount")
                        .value_name("AMOUNT")
                        .help("Invoice amount, overrides the project amount"),
                )
                .arg(
                    Arg::new("currency")
                        .long("currency")
                        .value_name("PKR|USD|EUR"),
                )
                .arg(
                    Arg::new("tax")
                        .long("tax")
                        .value_name("inclusive|exclusive")
                        .help("Whether the amount already includes tax"),
                )
                .arg(
                    Arg::new("client_name")
                        .long("client-name")
                        .value_name("NAME"),
                )
                .arg(
                    Arg::new("client_email")
                        .long("client-email")
                        .value_name("EMAIL"),
                )
                .arg(Arg::new("notes").long("notes").value_name("TEXT"))
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the invoice summary as JSON")
                        .action(ArgAction::SetTrue),
                ),
        )
}

use chrono::Local;
use clap::ArgMatches;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use super::render;
use crate::adapters::api::ApiClient;
use crate::application::{
    AppError, AppResult, ClientService, ProjectQuery, ProjectService, SessionContext,
};
use crate::domain::*;
use crate::ports::AppConfig;

/// Everything a command handler needs, built once in `main`.
pub struct CliContext {
    pub config: AppConfig,
    pub api: ApiClient,
    pub session: Arc<SessionContext>,
    pub projects: Arc<ProjectService>,
    pub clients: Arc<ClientService>,
}

fn arg<'a>(matches: &'a ArgMatches, id: &str) -> Option<&'a str> {
    matches.get_one::<String>(id).map(String::as_str)
}

fn parse_value<T>(value: &str) -> AppResult<T>
where
    T: std::str::FromStr<Err = DomainError>,
{
    Ok(value.parse::<T>()?)
}

fn read_password(prompt: &str) -> AppResult<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{prompt}")
        .and_then(|_| stdout.flush())
        .map_err(|e| AppError::Application(e.to_string()))?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| AppError::Application(e.to_string()))?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn password_arg(matches: &ArgMatches) -> AppResult<String> {
    match arg(matches, "password") {
        Some(password) => Ok(password.to_string()),
        None => read_password("Password: "),
    }
}

impl CliContext {
    fn per_page(&self, matches: &ArgMatches) -> usize {
        matches
            .get_one::<usize>("per_page")
            .copied()
            .filter(|n| *n > 0)
            .unwrap_or(self.config.page_size)
    }

    pub async fn login(&self, matches: &ArgMatches) -> AppResult<()> {
        let email = arg(matches, "email").unwrap_or_default();
        let password = password_arg(matches)?;

        let user = self.session.sign_in(email, &password).await?;
        self.api.set_token(self.session.token().await);
        println!("✅ Signed in as {} <{}>", user.full_name, user.email);
        Ok(())
    }

    pub async fn signup(&self, matches: &ArgMatches) -> AppResult<()> {
        let request = SignUp {
            full_name: arg(matches, "name").unwrap_or_default().trim().to_string(),
            email: arg(matches, "email").unwrap_or_default().trim().to_string(),
            password: password_arg(matches)?,
        };
        let email = request.email.clone();

        self.session.sign_up(request).await?;
        println!("✅ Account created for {email}. Sign in with `creator-desk login --email {email}`");
        Ok(())
    }

    /// The signed-in user, re-read from the session store so a login or
    /// logout from another terminal applies to this command.
    pub async fn signed_in_user(&self) -> AppResult<User> {
        let user = self.session.require_fresh_user().await?;
        self.api.set_token(self.session.token().await);
        Ok(user)
    }

    pub async fn logout(&self) -> AppResult<()> {
        self.session.sign_out().await?;
        self.api.set_token(None);
        println!("Signed out");
        Ok(())
    }

    pub async fn whoami(&self) -> AppResult<()> {
        let user = self.signed_in_user().await?;
        println!("{} <{}> ({})", user.full_name, user.email, user.id);
        Ok(())
    }

    pub async fn projects(&self, matches: &ArgMatches) -> AppResult<()> {
        let user = self.signed_in_user().await?;

        match matches.subcommand() {
            Some(("list", list)) => {
                let query = ProjectQuery {
                    drafts: list.get_flag("drafts"),
                    status: arg(list, "status").map(str::to_string),
                    search: arg(list, "search").map(str::to_string),
                    page: list.get_one::<usize>("page").copied().unwrap_or(1),
                    per_page: self.per_page(list),
                };
                let page = self
                    .projects
                    .list(&user.id, &query, !list.get_flag("refresh"))
                    .await?;

                if list.get_flag("json") {
                    let json = serde_json::to_string_pretty(&page.items)
                        .map_err(|e| AppError::Application(e.to_string()))?;
                    println!("{json}");
                } else {
                    println!("{}", render::project_table(&page));
                }
            }
            Some(("get", get)) => {
                let id = ProjectId::from(arg(get, "project_id").unwrap_or_default());
                let record = if get.get_flag("draft") {
                    self.projects.get_draft(&id, &user.id).await?
                } else {
                    self.projects.get_project(&id).await?
                };
                println!("{}", render::project_details(&record));
            }
            Some(("tag", tag)) => {
                let id = ProjectId::from(arg(tag, "project_id").unwrap_or_default());
                let record = match (arg(tag, "add"), arg(tag, "remove")) {
                    (Some(added), _) => self.projects.add_tag(&id, added).await?,
                    (None, Some(removed)) => self.projects.remove_tag(&id, removed).await?,
                    (None, None) => {
                        return Err(AppError::Application(
                            "Pass --add or --remove".to_string(),
                        ))
                    }
                };
                println!("✅ Tags: {}", record.draft.tags.join(", "));
            }
            Some(("status", status)) => {
                let id = ProjectId::from(arg(status, "project_id").unwrap_or_default());
                let new_status: ProjectStatus =
                    parse_value(arg(status, "status").unwrap_or_default())?;
                self.projects.set_status(&id, new_status).await?;
                println!("✅ {id} is now {new_status}");
            }
            Some(("upload", upload)) => {
                let files: Vec<PathBuf> = upload
                    .get_many::<PathBuf>("files")
                    .map(|files| files.cloned().collect())
                    .unwrap_or_default();
                let uploaded = self.projects.upload_media(files).await?;
                for url in &uploaded.urls {
                    println!("{url}");
                }
                if let Some(pid) = uploaded.project_id {
                    println!("Project: {pid}");
                }
            }
            _ => return Err(AppError::Application("Unknown projects subcommand".to_string())),
        }

        Ok(())
    }

    pub async fn clients(&self, matches: &ArgMatches) -> AppResult<()> {
        self.signed_in_user().await?;

        match matches.subcommand() {
            Some(("list", list)) => {
                let page = list.get_one::<usize>("page").copied().unwrap_or(1);
                let clients = self.clients.list(page, self.per_page(list)).await?;
                println!("{}", render::client_table(&clients));
            }
            Some(("get", get)) => {
                let id = ClientId::from(arg(get, "client_id").unwrap_or_default());
                let client = self.clients.get(&id, true).await?;
                println!("{}", render::client_details(&client));
            }
            Some(("create", create)) => {
                let draft = client_draft_from(create, ClientDraft::default())?;
                let client = self.clients.create(draft).await?;
                println!("✅ Created client {} ({})", client.details.full_name, client.id);
            }
            Some(("update", update)) => {
                let id = ClientId::from(arg(update, "client_id").unwrap_or_default());
                let current = self.clients.get(&id, false).await?;
                let draft = client_draft_from(update, current.to_draft())?;
                let client = self.clients.update(&id, draft).await?;
                println!("✅ Updated client {}", client.id);
            }
            _ => return Err(AppError::Application("Unknown clients subcommand".to_string())),
        }

        Ok(())
    }

    pub async fn invoice(&self, matches: &ArgMatches) -> AppResult<()> {
        self.signed_in_user().await?;
        let today = Local::now().date_naive();

        let mut invoice = match arg(matches, "project") {
            Some(id) => {
                let record = self.projects.get_project(&ProjectId::from(id)).await?;
                InvoiceDraft::for_project(&record, today)
            }
            None => InvoiceDraft::standalone(today),
        };

        if let Some(selected) = matches.get_many::<String>("select") {
            for value in selected {
                apply_selection(&mut invoice, value)?;
            }
        }
        apply_invoice_overrides(&mut invoice, matches)?;

        let summary = invoice.summary(self.config.invoice_tax_rate);
        tracing::info!(
            invoice_type = %summary.invoice_type,
            total = %summary.totals.total,
            "invoice generated"
        );

        if matches.get_flag("json") {
            let json = serde_json::to_string_pretty(&summary)
                .map_err(|e| AppError::Application(e.to_string()))?;
            println!("{json}");
        } else {
            println!("{}", render::invoice_text(&invoice, &summary));
        }
        Ok(())
    }
}

/// Overlays the flags that were passed on top of `base`.
fn client_draft_from(matches: &ArgMatches, base: ClientDraft) -> AppResult<ClientDraft> {
    let mut draft = base;
    let text_fields: [(&str, &mut String); 7] = [
        ("name", &mut draft.full_name),
        ("email", &mut draft.email),
        ("phone", &mut draft.phone),
        ("company", &mut draft.company),
        ("address", &mut draft.address),
        ("contact_name", &mut draft.contact_person_name),
        ("contact_role", &mut draft.contact_person_role),
    ];
    for (id, slot) in text_fields {
        if let Some(value) = arg(matches, id) {
            *slot = value.trim().to_string();
        }
    }
    if let Some(kind) = arg(matches, "type") {
        draft.client_type = Some(parse_value(kind)?);
    }
    Ok(draft)
}

/// Bills one milestone (by name) or one contract month (`3` or `Month 3`).
fn apply_selection(invoice: &mut InvoiceDraft, value: &str) -> AppResult<()> {
    match invoice.payment_structure() {
        Some(PaymentStructure::Multiple) => {
            invoice.toggle_milestone(value.trim())?;
        }
        Some(PaymentStructure::Recurring) => {
            let trimmed = value.trim();
            let number = trimmed
                .strip_prefix("Month")
                .or_else(|| trimmed.strip_prefix("month"))
                .unwrap_or(trimmed)
                .trim();
            let month: u32 = number
                .parse()
                .map_err(|_| AppError::Application(format!("{value:?} is not a contract month")))?;
            invoice.toggle_month(month)?;
        }
        _ => {
            return Err(AppError::Application(
                "Only milestone and recurring projects support --select".to_string(),
            ))
        }
    }
    Ok(())
}

fn apply_invoice_overrides(invoice: &mut InvoiceDraft, matches: &ArgMatches) -> AppResult<()> {
    if let Some(amount) = arg(matches, "amount") {
        invoice.amount = parse_amount(amount)?;
    }
    if let Some(currency) = arg(matches, "currency") {
        invoice.currency = parse_value(currency)?;
    }
    if let Some(tax) = arg(matches, "tax") {
        invoice.tax_handling = parse_value(tax)?;
    }
    if let Some(name) = arg(matches, "client_name") {
        invoice.client_name = name.trim().to_string();
    }
    if let Some(email) = arg(matches, "client_email") {
        invoice.client_email = email.trim().to_string();
    }
    if let Some(notes) = arg(matches, "notes") {
        invoice.notes = notes.to_string();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cli::build_cli;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn sub_matches(args: &[&str]) -> ArgMatches {
        let matches = build_cli().try_get_matches_from(args).unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        sub.clone()
    }

    fn recurring_invoice() -> InvoiceDraft {
        let mut draft = ProjectDraft {
            project_name: "Retainer".to_string(),
            project_amount: Some(Decimal::from(1200)),
            ..Default::default()
        };
        draft.select_structure(PaymentStructure::Recurring);
        draft.recurring_mut().unwrap().contract_duration = Some(12);
        let record = ProjectRecord {
            id: ProjectId::from("p-7"),
            draft,
            is_draft: false,
            created_at: None,
            updated_at: None,
        };
        InvoiceDraft::for_project(&record, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
    }

    #[test]
    fn test_select_months() {
        let mut invoice = recurring_invoice();
        apply_selection(&mut invoice, "Month 1").unwrap();
        apply_selection(&mut invoice, "2").unwrap();
        apply_selection(&mut invoice, "month 3").unwrap();
        assert_eq!(invoice.amount, Decimal::from(300));

        assert!(matches!(
            apply_selection(&mut invoice, "Shoot"),
            Err(AppError::Application(_))
        ));
        for outside in ["0", "Month 13"] {
            assert!(matches!(
                apply_selection(&mut invoice, outside),
                Err(AppError::Domain(DomainError::MonthOutOfRange { duration: 12, .. }))
            ));
        }
        assert_eq!(invoice.amount, Decimal::from(300));
    }

    #[test]
    fn test_select_on_standalone_is_rejected() {
        let mut invoice = InvoiceDraft::standalone(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert!(apply_selection(&mut invoice, "A").is_err());
    }

    #[test]
    fn test_invoice_overrides() {
        let matches = sub_matches(&[
            "creator-desk",
            "invoice",
            "--amount",
            "250.50",
            "--currency",
            "usd",
            "--tax",
            "Exclusive",
            "--client-name",
            " Bilal ",
        ]);
        let mut invoice = InvoiceDraft::standalone(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        apply_invoice_overrides(&mut invoice, &matches).unwrap();

        assert_eq!(invoice.amount, Decimal::new(25050, 2));
        assert_eq!(invoice.currency, Currency::Usd);
        assert_eq!(invoice.tax_handling, TaxHandling::Exclusive);
        assert_eq!(invoice.client_name, "Bilal");
    }

    #[test]
    fn test_invalid_override_is_an_error() {
        let matches = sub_matches(&["creator-desk", "invoice", "--tax", "sometimes"]);
        let mut invoice = InvoiceDraft::standalone(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert!(matches!(
            apply_invoice_overrides(&mut invoice, &matches),
            Err(AppError::Domain(DomainError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn test_client_update_keeps_unset_fields() {
        let matches = build_cli()
            .try_get_matches_from([
                "creator-desk",
                "clients",
                "update",
                "c-1",
                "--phone",
                "03001234567",
            ])
            .unwrap();
        let (_, clients) = matches.subcommand().unwrap();
        let (_, update) = clients.subcommand().unwrap();

        let base = ClientDraft {
            full_name: "Sana".to_string(),
            client_type: Some(ClientKind::Individual),
            phone: "000".to_string(),
            ..Default::default()
        };
        let draft = client_draft_from(update, base).unwrap();
        assert_eq!(draft.full_name, "Sana");
        assert_eq!(draft.phone, "03001234567");
        assert_eq!(draft.client_type, Some(ClientKind::Individual));
    }
}

use std::fmt::Write;

use crate::application::Page;
use crate::domain::*;

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let kept: String = value.chars().take(width.saturating_sub(1)).collect();
    format!("{kept}…")
}

fn page_footer<T>(page: &Page<T>, noun: &str) -> String {
    format!(
        "Page {} of {} ({} {noun})",
        page.page,
        page.page_count().max(1),
        page.total
    )
}

pub fn project_table(page: &Page<ProjectSummary>) -> String {
    if page.items.is_empty() {
        return "No projects found".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<26} {:<28} {:<22} {:<12} {:>14} {:<26}",
        "ID", "NAME", "TYPE", "DUE", "AMOUNT", "STATUS"
    );
    for project in &page.items {
        let amount = match (project.amount, project.currency) {
            (Some(amount), Some(currency)) => format!("{} {currency}", format_money(amount)),
            (Some(amount), None) => format_money(amount),
            (None, _) => "-".to_string(),
        };
        let _ = writeln!(
            out,
            "{:<26} {:<28} {:<22} {:<12} {:>14} {:<26}",
            truncate(&project.id.0, 26),
            truncate(or_dash(&project.name), 28),
            project
                .project_type
                .map(|t| truncate(t.as_str(), 22))
                .unwrap_or_else(|| "-".to_string()),
            project
                .due_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
            amount,
            or_dash(&project.status),
        );
        if !project.tags.is_empty() {
            let _ = writeln!(out, "{:<26} #{}", "", project.tags.join(" #"));
        }
    }
    out.push_str(&page_footer(page, "projects"));
    out
}

pub fn project_details(record: &ProjectRecord) -> String {
    let draft = &record.draft;
    let mut out = String::new();
    let label = |o: Option<&'static str>| o.unwrap_or("-");

    let _ = writeln!(out, "{} ({})", or_dash(&draft.project_name), record.id);
    if record.is_draft {
        let _ = writeln!(out, "Saved as draft");
    }
    let _ = writeln!(out, "Type:        {}", label(draft.project_type.map(|t| t.as_str())));
    let _ = writeln!(out, "Client:      {}", label(draft.client.map(|c| c.as_str())));
    let _ = writeln!(out, "Status:      {}", label(draft.project_status.map(|s| s.as_str())));
    let _ = writeln!(
        out,
        "Schedule:    {} to {}",
        draft.start_date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
        draft.end_date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
    );
    if !draft.description.trim().is_empty() {
        let _ = writeln!(out, "Description: {}", draft.description);
    }
    if !draft.tags.is_empty() {
        let _ = writeln!(out, "Tags:        {}", draft.tags.join(", "));
    }
    for item in &draft.media {
        let _ = writeln!(out, "Media:       {}", item.label());
    }
    if !draft.contact_name.trim().is_empty() {
        let _ = writeln!(
            out,
            "Contact:     {} {} {} {}",
            draft.contact_name, draft.contact_role, draft.contact_email, draft.contact_number
        );
    }

    let currency = draft.currency.map(|c| c.to_string()).unwrap_or_default();
    let _ = writeln!(
        out,
        "Payment:     {}",
        draft
            .payment_structure()
            .map(|s| s.title())
            .unwrap_or("-")
    );
    if let Some(amount) = draft.project_amount {
        let _ = writeln!(out, "Amount:      {} {currency}", format_money(amount));
        match &draft.plan {
            Some(PaymentPlan::Milestones(milestones)) => {
                for milestone in milestones {
                    let _ = writeln!(
                        out,
                        "  - {} ({}%): {} {currency}",
                        milestone.name,
                        milestone.percent.normalize(),
                        format_money(milestone_amount(amount, milestone))
                    );
                }
            }
            Some(PaymentPlan::Recurring(schedule)) => {
                if let Some(duration) = schedule.contract_duration {
                    let _ = writeln!(
                        out,
                        "  {} x {} {currency} {}",
                        duration,
                        format_money(installment_amount(amount, Some(duration))),
                        schedule.frequency.map(|f| f.as_str()).unwrap_or("")
                    );
                }
            }
            Some(PaymentPlan::Single) | None => {}
        }
    }
    if let Some(financing) = draft.financing {
        let _ = writeln!(out, "Financing:   {financing}");
    }
    out.trim_end().to_string()
}

pub fn client_table(page: &Page<Client>) -> String {
    if page.items.is_empty() {
        return "No clients found".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<26} {:<24} {:<11} {:<22} {:<28} {:<16}",
        "ID", "NAME", "TYPE", "COMPANY", "EMAIL", "PHONE"
    );
    for client in &page.items {
        let details = &client.details;
        let _ = writeln!(
            out,
            "{:<26} {:<24} {:<11} {:<22} {:<28} {:<16}",
            truncate(&client.id.0, 26),
            truncate(or_dash(&details.full_name), 24),
            details.client_type.map(|k| k.as_str()).unwrap_or("-"),
            truncate(client.display_company(), 22),
            truncate(or_dash(&details.email), 28),
            or_dash(&details.phone),
        );
    }
    out.push_str(&page_footer(page, "clients"));
    out
}

pub fn client_details(client: &Client) -> String {
    let details = &client.details;
    let rows = [
        ("Name", details.full_name.as_str()),
        (
            "Type",
            details.client_type.map(|k| k.as_str()).unwrap_or(""),
        ),
        ("Company", client.display_company()),
        ("Email", details.email.as_str()),
        ("Phone", details.phone.as_str()),
        ("Address", details.address.as_str()),
        ("Contact", details.contact_person_name.as_str()),
        ("Role", details.contact_person_role.as_str()),
    ];

    let mut out = format!("Client {}\n", client.id);
    for (label, value) in rows {
        let _ = writeln!(out, "{:<9}{}", format!("{label}:"), or_dash(value));
    }
    out.trim_end().to_string()
}

pub fn invoice_text(invoice: &InvoiceDraft, summary: &InvoiceSummary) -> String {
    let currency = summary.currency;
    let mut out = String::new();

    let _ = writeln!(out, "INVOICE ({})", summary.status);
    let _ = writeln!(out, "Type:      {}", summary.invoice_type);
    if let Some(project) = &summary.project {
        let _ = writeln!(out, "Project:   {project}");
    }
    let _ = writeln!(out, "Issued:    {}", summary.issue_date);
    let _ = writeln!(out, "Due:       {}", summary.due_date);
    let _ = writeln!(out);

    let _ = writeln!(out, "Bill to:   {}", or_dash(&summary.client_name));
    for line in [&invoice.company, &invoice.client_email, &invoice.phone, &invoice.address] {
        if !line.trim().is_empty() {
            let _ = writeln!(out, "           {line}");
        }
    }
    let _ = writeln!(out);

    if let InvoiceSource::Project {
        plan, selection, ..
    } = &invoice.source
    {
        match plan {
            Some(PaymentPlan::Milestones(_)) => {
                for name in selection.milestone_names() {
                    let _ = writeln!(out, "  [x] {name}");
                }
            }
            Some(PaymentPlan::Recurring(_)) => {
                for month in selection.months() {
                    let _ = writeln!(out, "  [x] Month {month}");
                }
            }
            Some(PaymentPlan::Single) | None => {}
        }
    }

    let totals = &summary.totals;
    let _ = writeln!(
        out,
        "Subtotal:  {:>14} {currency}",
        format_money(totals.subtotal)
    );
    let _ = writeln!(
        out,
        "Tax {:<5} {:>14} {currency} ({})",
        format!("{}:", summary.tax_rate),
        format_money(totals.tax),
        summary.tax_handling
    );
    let _ = writeln!(out, "Total:     {:>14} {currency}", format_money(totals.total));

    if !invoice.notes.trim().is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Notes: {}", invoice.notes);
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn summary(id: &str, name: &str) -> ProjectSummary {
        ProjectSummary {
            id: ProjectId::from(id),
            name: name.to_string(),
            project_type: Some(ProjectType::VideoProduction),
            due_date: NaiveDate::from_ymd_opt(2025, 3, 1),
            currency: Some(Currency::Usd),
            amount: Some(Decimal::from(1500)),
            status: "Project Started".to_string(),
            tags: vec!["film".to_string()],
            created_at: None,
        }
    }

    #[test]
    fn test_project_table() {
        let page = Page {
            items: vec![summary("p-1", "Brand film")],
            page: 1,
            per_page: 6,
            total: 1,
        };
        let text = project_table(&page);
        assert!(text.contains("Brand film"));
        assert!(text.contains("1500.00 USD"));
        assert!(text.contains("#film"));
        assert!(text.ends_with("Page 1 of 1 (1 projects)"));

        let empty: Page<ProjectSummary> = Page {
            items: vec![],
            page: 1,
            per_page: 6,
            total: 0,
        };
        assert_eq!(project_table(&empty), "No projects found");
    }

    #[test]
    fn test_truncate_long_values() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }

    #[test]
    fn test_client_details_placeholders() {
        let client = Client {
            id: ClientId::from("c-9"),
            details: ClientDraft {
                full_name: "Ayesha".to_string(),
                client_type: Some(ClientKind::Brand),
                email: "ayesha@example.com".to_string(),
                ..Default::default()
            },
        };
        let text = client_details(&client);
        assert!(text.starts_with("Client c-9"));
        assert!(text.contains("Company: No company"));
        assert!(text.contains("Phone:   -"));
    }

    #[test]
    fn test_invoice_text_with_milestone_selection() {
        let record = ProjectRecord {
            id: ProjectId::from("p-1"),
            draft: ProjectDraft {
                project_name: "Campaign".to_string(),
                project_amount: Some(Decimal::from(1000)),
                currency: Some(Currency::Pkr),
                plan: Some(PaymentPlan::Milestones(vec![
                    Milestone::new("A", Decimal::from(40), ""),
                    Milestone::new("B", Decimal::from(60), ""),
                ])),
                ..Default::default()
            },
            is_draft: false,
            created_at: None,
            updated_at: None,
        };
        let today = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let mut invoice = InvoiceDraft::for_project(&record, today);
        invoice.tax_handling = TaxHandling::Exclusive;
        invoice.toggle_milestone("A").unwrap();

        let text = invoice_text(&invoice, &invoice.summary(TaxRate::invoice()));
        assert!(text.contains("Project:   Campaign"));
        assert!(text.contains("[x] A"));
        assert!(text.contains("400.00 PKR"));
        assert!(text.contains("60.00 PKR (exclusive)"));
        assert!(text.contains("460.00 PKR"));
        assert!(text.contains("Due:       2025-02-09"));
    }
}

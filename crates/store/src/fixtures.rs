//! Demo business records for local runs.
//!
//! Dates are generated relative to `today` so aging buckets, upcoming
//! deadlines and recent transactions always look current.

use chrono::{Duration, NaiveDate, Utc};
use serde_json::{Value, json};
use steward_core::error::StoreError;
use steward_core::store::DataStore;

fn day(today: NaiveDate, offset: i64) -> String {
    (today + Duration::days(offset)).format("%Y-%m-%d").to_string()
}

fn at(today: NaiveDate, offset: i64, time: &str) -> String {
    format!("{}T{time}Z", day(today, offset))
}

/// Demo documents for one business and user, as `(collection, document)`.
pub fn demo_documents(business_id: &str, user_id: &str, today: NaiveDate) -> Vec<(&'static str, Value)> {
    let b = business_id;
    let u = user_id;
    let mut docs = Vec::new();

    let invoices = [
        ("inv-1001", "Acme Supply", 4200.0, -75, "open"),
        ("inv-1002", "Globex", 1850.0, -52, "open"),
        ("inv-1003", "Initech", 920.0, -38, "open"),
        ("inv-1004", "Umbrella Co", 3100.0, -12, "open"),
        ("inv-1005", "Hooli", 640.0, 9, "open"),
        ("inv-1006", "Acme Supply", 2750.0, -20, "paid"),
    ];
    for (id, customer, amount, due_offset, status) in invoices {
        docs.push((
            "invoices",
            json!({
                "id": id,
                "businessId": b,
                "customer": { "name": customer },
                "amount": amount,
                "issuedDate": day(today, due_offset - 30),
                "dueDate": day(today, due_offset),
                "status": status,
            }),
        ));
    }

    let transactions = [
        (-2, 5400.0, "sales", "Card settlements"),
        (-4, -1200.0, "payroll", "Contractor payout"),
        (-9, -2100.0, "rent", "Office lease"),
        (-15, 2750.0, "receivables", "Acme Supply inv-1006"),
        (-21, -380.0, "software", "SaaS subscriptions"),
        (-27, 6100.0, "sales", "Card settlements"),
        (-33, -1900.0, "payroll", "Contractor payout"),
    ];
    for (i, (offset, amount, category, description)) in transactions.into_iter().enumerate() {
        docs.push((
            "transactions",
            json!({
                "id": format!("txn-{}", i + 1),
                "businessId": b,
                "date": day(today, offset),
                "amount": amount,
                "category": category,
                "description": description,
            }),
        ));
    }

    let expenses = [
        (-3, "software", 380.0, "Figma"),
        (-6, "travel", 740.0, "Delta"),
        (-10, "rent", 2100.0, "Northside Properties"),
        (-14, "marketing", 1250.0, "Meta Ads"),
        (-18, "software", 120.0, "GitHub"),
        (-40, "travel", 310.0, "Hilton"),
    ];
    for (i, (offset, category, amount, vendor)) in expenses.into_iter().enumerate() {
        docs.push((
            "expenses",
            json!({
                "id": format!("exp-{}", i + 1),
                "businessId": b,
                "date": day(today, offset),
                "category": category,
                "amount": amount,
                "vendor": vendor,
            }),
        ));
    }

    let campaigns = [
        ("Spring Launch", "email", 800.0, 42000, 1900, 85, 6400.0, "active"),
        ("Retargeting Q2", "social", 1250.0, 98000, 2300, 41, 3900.0, "active"),
        ("Brand Search", "search", 600.0, 15000, 1100, 62, 5100.0, "paused"),
    ];
    for (i, (name, channel, spend, impressions, clicks, conversions, revenue, status)) in
        campaigns.into_iter().enumerate()
    {
        docs.push((
            "campaigns",
            json!({
                "id": format!("cmp-{}", i + 1),
                "businessId": b,
                "name": name,
                "channel": channel,
                "spend": spend,
                "impressions": impressions,
                "clicks": clicks,
                "conversions": conversions,
                "revenue": revenue,
                "startDate": day(today, -30 - 10 * i as i64),
                "status": status,
            }),
        ));
    }

    let deadlines = [
        ("Quarterly estimated tax", "federal", 14, "upcoming"),
        ("Sales tax return", "state", 28, "upcoming"),
        ("Payroll tax deposit", "federal", 5, "upcoming"),
        ("Annual report", "state", -20, "filed"),
    ];
    for (i, (name, jurisdiction, offset, status)) in deadlines.into_iter().enumerate() {
        docs.push((
            "tax_deadlines",
            json!({
                "id": format!("tax-{}", i + 1),
                "businessId": b,
                "name": name,
                "jurisdiction": jurisdiction,
                "dueDate": day(today, offset),
                "status": status,
            }),
        ));
    }

    let events = [
        ("Weekly pipeline review", 1, "10:00:00", "10:30:00"),
        ("Accountant check-in", 2, "15:00:00", "15:45:00"),
        ("Vendor call: Northside", 4, "09:00:00", "09:30:00"),
    ];
    for (i, (title, offset, start, end)) in events.into_iter().enumerate() {
        docs.push((
            "events",
            json!({
                "id": format!("evt-{}", i + 1),
                "businessId": b,
                "userId": u,
                "title": title,
                "start": at(today, offset, start),
                "end": at(today, offset, end),
            }),
        ));
    }

    let emails = [
        ("th-1", "jane@acme.example", "Re: Invoice inv-1001", "We'll send payment next week, can you confirm the amount?", -1, true),
        ("th-1", "jane@acme.example", "Invoice inv-1001", "Received the invoice, forwarding to AP.", -20, false),
        ("th-2", "ops@globex.example", "Delivery schedule", "Can we move Thursday's delivery to Friday?", -2, true),
        ("th-3", "news@saas.example", "Your monthly usage report", "Here is your usage summary for the month.", -3, false),
    ];
    for (i, (thread, from, subject, snippet, offset, unread)) in emails.into_iter().enumerate() {
        docs.push((
            "emails",
            json!({
                "id": format!("eml-{}", i + 1),
                "businessId": b,
                "userId": u,
                "threadId": thread,
                "from": from,
                "subject": subject,
                "snippet": snippet,
                "receivedAt": at(today, offset, "08:15:00"),
                "unread": unread,
            }),
        ));
    }

    let history = [
        ("user", "How are receivables looking?", "09:00:00"),
        ("assistant", "Five invoices are open, two of them more than 45 days past due.", "09:00:05"),
    ];
    for (i, (role, content, time)) in history.into_iter().enumerate() {
        docs.push((
            "messages",
            json!({
                "id": format!("msg-{}", i + 1),
                "businessId": b,
                "userId": u,
                "role": role,
                "content": content,
                "createdAt": at(today, -1, time),
            }),
        ));
    }

    docs
}

/// Insert the demo documents into any store. Returns how many were written.
pub async fn seed_demo(
    store: &dyn DataStore,
    business_id: &str,
    user_id: &str,
) -> Result<usize, StoreError> {
    let docs = demo_documents(business_id, user_id, Utc::now().date_naive());
    let count = docs.len();
    for (collection, doc) in docs {
        store.insert(collection, doc).await?;
    }
    tracing::info!(business_id, documents = count, "Seeded demo data");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryStore;
    use steward_core::store::StoreQuery;

    #[test]
    fn dates_are_relative_to_today() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let docs = demo_documents("b1", "u1", today);
        let first_invoice = docs.iter().find(|(c, _)| *c == "invoices").unwrap();
        assert_eq!(first_invoice.1["dueDate"], "2025-12-16");
    }

    #[tokio::test]
    async fn seed_populates_every_collection() {
        let store = InMemoryStore::new();
        let n = seed_demo(&store, "b1", "u1").await.unwrap();
        assert!(n > 20);
        for collection in [
            "invoices",
            "transactions",
            "expenses",
            "campaigns",
            "tax_deadlines",
            "events",
            "emails",
            "messages",
        ] {
            assert!(store.count(collection).await.unwrap() > 0, "{collection} empty");
        }

        let open = store
            .find(&StoreQuery::new("invoices").eq("status", "open"))
            .await
            .unwrap();
        assert_eq!(open.len(), 5);
    }
}

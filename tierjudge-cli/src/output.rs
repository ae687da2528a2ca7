/// Output formatting: terminal table and JSON.
use serde::Serialize;
use tierjudge_core::{ComparisonPair, CutSource, Ledger, RefinementReport, Tiers};

use crate::bail;

#[derive(Serialize)]
struct JsonItem {
    rank: usize,
    id: String,
    name: String,
    wins: u32,
    losses: u32,
    win_rate: f64,
}

#[derive(Serialize)]
struct JsonTier {
    name: String,
    items: Vec<JsonItem>,
}

#[derive(Serialize)]
struct JsonPair {
    a: String,
    b: String,
}

#[derive(Serialize)]
struct JsonTiersOutput<'a> {
    tiers: Vec<JsonTier>,
    votes: usize,
    report: Option<&'a RefinementReport>,
    next_pairs: Vec<JsonPair>,
}

fn display_name(name: &str, id: &str) -> String {
    if name.trim().is_empty() {
        id.to_string()
    } else {
        name.to_string()
    }
}

fn json_pairs(pairs: &[ComparisonPair]) -> Vec<JsonPair> {
    pairs
        .iter()
        .map(|(a, b)| JsonPair { a: a.id.clone(), b: b.id.clone() })
        .collect()
}

fn print_json_value(value: &impl Serialize) {
    let text = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| bail(format!("Failed to serialize output: {e}")));
    println!("{text}");
}

fn cut_source_label(source: CutSource) -> &'static str {
    match source {
        CutSource::Refined => "refined",
        CutSource::Quantile => "quantile",
    }
}

/// Print the board as a formatted terminal table, tiers in order.
pub fn print_table(
    tiers: &Tiers,
    tier_order: &[String],
    ledger: &Ledger,
    votes: usize,
    report: Option<&RefinementReport>,
    next_pairs: &[ComparisonPair],
) {
    let ordered = tiers.iter_ordered(tier_order);

    let tier_width = ordered.iter().map(|(t, _)| t.len()).max().unwrap_or(4).max(4);
    let name_width = ordered
        .iter()
        .flat_map(|(_, items)| items.iter())
        .map(|i| display_name(&i.name, &i.id).len())
        .max()
        .unwrap_or(4)
        .max(4);

    println!("{:<tier_width$} |  # | {:<name_width$} |   W-L | Win rate", "Tier", "Item");
    println!("{}-|----|-{}-|-------|---------", "-".repeat(tier_width), "-".repeat(name_width));

    for (tier, items) in &ordered {
        if items.is_empty() {
            println!("{tier:<tier_width$} |  - |");
            continue;
        }
        for (i, item) in items.iter().enumerate() {
            let record = ledger.record(&item.id);
            let label = if i == 0 { tier.as_str() } else { "" };
            println!(
                "{:<tier_width$} | {:>2} | {:<name_width$} | {:>5} | {:>7.1}%",
                label,
                i + 1,
                display_name(&item.name, &item.id),
                format!("{}-{}", record.wins, record.losses),
                record.win_rate * 100.0,
            );
        }
    }

    println!("\n{} items in {} tiers ({} votes)", tiers.item_count(), tier_order.len(), votes);
    if let Some(r) = report {
        println!(
            "Boundaries: {} cuts {:?} (churn {:.3}, ramp {:.2}, z {:.2})",
            cut_source_label(r.cut_source),
            match r.cut_source {
                CutSource::Refined => &r.refined_cuts,
                CutSource::Quantile => &r.quantile_cuts,
            },
            r.churn,
            r.ramp,
            r.z,
        );
    }

    if !next_pairs.is_empty() {
        println!("\nNext comparisons:");
        print_pairs(next_pairs);
    }
}

/// Print the board as JSON.
pub fn print_json(
    tiers: &Tiers,
    tier_order: &[String],
    ledger: &Ledger,
    votes: usize,
    report: Option<&RefinementReport>,
    next_pairs: &[ComparisonPair],
) {
    let tiers: Vec<JsonTier> = tiers
        .iter_ordered(tier_order)
        .into_iter()
        .map(|(name, items)| JsonTier {
            name,
            items: items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    let record = ledger.record(&item.id);
                    JsonItem {
                        rank: i + 1,
                        id: item.id.clone(),
                        name: display_name(&item.name, &item.id),
                        wins: record.wins,
                        losses: record.losses,
                        win_rate: record.win_rate,
                    }
                })
                .collect(),
        })
        .collect();

    print_json_value(&JsonTiersOutput { tiers, votes, report, next_pairs: json_pairs(next_pairs) });
}

/// Print a comparison queue, one numbered pair per line.
pub fn print_pairs(pairs: &[ComparisonPair]) {
    for (i, (a, b)) in pairs.iter().enumerate() {
        println!(
            "{:>3}. {}  vs  {}",
            i + 1,
            display_name(&a.name, &a.id),
            display_name(&b.name, &b.id),
        );
    }
}

/// Print a comparison queue as a JSON array of `{a, b}` id pairs.
pub fn print_pairs_json(pairs: &[ComparisonPair]) {
    print_json_value(&json_pairs(pairs));
}

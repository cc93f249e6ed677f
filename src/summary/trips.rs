//! Trip-type and transport-app usage views.

use super::{Share, pct, tally};
use crate::codes::APP_USAGE;
use crate::prepare::{PreparedRecord, PreparedTable, TripContext, TripKind};
use serde::Serialize;

/// Display order for app-usage intensity labels.
pub const APP_USAGE_ORDER: [&str; 4] = ["Nunca", "Às vezes", "Sempre", "Não declarado"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KindShare {
    pub kind: TripKind,
    pub percent: f64,
}

/// Trip-type percentages for one context and the population it covers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextTripTypes {
    pub context: TripContext,
    pub population: usize,
    pub shares: Vec<KindShare>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripTypeView {
    pub pct_working: f64,
    pub pct_studying: f64,
    pub pct_work_terminal: f64,
    pub pct_class_integration: f64,
    pub contexts: Vec<ContextTripTypes>,
}

/// Percentages of each trip kind among `kinds`, in [`TripKind::ALL`] order.
/// An empty population yields zeros.
pub fn kind_shares<I>(kinds: I) -> (usize, Vec<KindShare>)
where
    I: IntoIterator<Item = TripKind>,
{
    let counts = tally(kinds);
    let total: usize = counts.values().sum();
    let shares = TripKind::ALL
        .iter()
        .map(|kind| KindShare {
            kind: *kind,
            percent: pct(counts.get(kind).copied().unwrap_or(0), total),
        })
        .collect();
    (total, shares)
}

/// Work trips among workers, class trips among students, children's trips
/// over everyone.
pub fn trip_types(table: &PreparedTable) -> TripTypeView {
    let n = table.len();
    let count = |f: fn(&PreparedRecord) -> bool| table.iter().filter(|r| f(r)).count();

    let contexts = TripContext::ALL
        .iter()
        .map(|&context| {
            let kinds = table
                .iter()
                .filter(|r| match context {
                    TripContext::Work => r.works,
                    TripContext::Class => r.studies,
                    TripContext::Children => true,
                })
                .map(|r| r.trip(context));
            let (population, shares) = kind_shares(kinds);
            ContextTripTypes {
                context,
                population,
                shares,
            }
        })
        .collect();

    TripTypeView {
        pct_working: pct(count(|r| r.works), n),
        pct_studying: pct(count(|r| r.studies), n),
        pct_work_terminal: pct(count(|r| r.uses_work_terminal), n),
        pct_class_integration: pct(count(|r| r.uses_class_integration), n),
        contexts,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppUsage {
    pub context: TripContext,
    pub shares: Vec<Share>,
}

fn app_code(record: &PreparedRecord, context: TripContext) -> Option<i64> {
    match context {
        TripContext::Work => record.raw.app_usage_work,
        TripContext::Class => record.raw.app_usage_class,
        TripContext::Children => record.raw.app_usage_school,
    }
}

/// Ride-hailing app usage intensity per trip context.
///
/// Percentages are over respondents whose code maps to a label; labels with
/// no respondents are omitted.
pub fn transport_apps(table: &PreparedTable) -> Vec<AppUsage> {
    TripContext::ALL
        .iter()
        .map(|&context| {
            let counts = tally(
                table
                    .iter()
                    .filter_map(|r| APP_USAGE.get_opt(app_code(r, context))),
            );
            let total: usize = counts.values().sum();
            let shares = APP_USAGE_ORDER
                .iter()
                .filter_map(|label| {
                    counts.get(label).map(|&count| Share {
                        label: label.to_string(),
                        count,
                        percent: pct(count, total),
                    })
                })
                .collect();
            AppUsage { context, shares }
        })
        .collect()
}

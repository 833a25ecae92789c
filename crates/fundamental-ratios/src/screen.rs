use ratio_core::{RatioKind, RatioReport};

/// Default ceiling for the low P/E screen.
pub const DEFAULT_MAX_PE: f64 = 25.0;

/// Reports with a computed P/E strictly between 0 and `max_pe`, cheapest first.
pub fn low_pe_screen<'a, I>(reports: I, max_pe: f64) -> Vec<&'a RatioReport>
where
    I: IntoIterator<Item = &'a RatioReport>,
{
    let mut hits: Vec<(f64, &RatioReport)> = reports
        .into_iter()
        .filter_map(|report| {
            report
                .computed(RatioKind::Pe)
                .filter(|pe| *pe > 0.0 && *pe < max_pe)
                .map(|pe| (pe, report))
        })
        .collect();

    hits.sort_by(|(a, ra), (b, rb)| a.total_cmp(b).then_with(|| ra.symbol.cmp(&rb.symbol)));
    hits.into_iter().map(|(_, report)| report).collect()
}

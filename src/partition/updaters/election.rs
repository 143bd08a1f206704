use std::{collections::BTreeMap, rc::Rc};

use anyhow::Result;

use crate::partition::{Partition, updaters::{StatValue, Updater, Updaters}};

/// A named election over one vote-count node series per party.
///
/// `updaters()` expands the election into registry entries: a tally per
/// column keyed by the column name, a proportion per column keyed
/// `"<column>%"`, and the per-district total keyed by the election name.
#[derive(Clone, Debug)]
pub struct Election {
    name: String,
    columns: Vec<String>,
}

impl Election {
    pub fn new(
        name: impl Into<String>,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Election name, also the registry key of its totals updater.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Vote columns in registration order.
    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The registry entries this election contributes to a partition.
    pub fn updaters(&self) -> Updaters {
        let mut updaters = Updaters::new();
        for column in &self.columns {
            updaters.insert(column.clone(), Updater::tally(column.clone()));
            updaters.insert(
                format!("{column}%"),
                Updater::Proportion { column: column.clone(), columns: self.columns.clone() },
            );
        }
        updaters.insert(
            self.name.clone(),
            Updater::ElectionTotals { columns: self.columns.clone() },
        );
        updaters
    }
}

/// Per district, one column's share of the election total. Districts with a
/// zero total get `NaN` rather than an error.
pub(super) fn proportion(
    partition: &Partition,
    column: &str,
    columns: &[String],
) -> Result<Rc<StatValue>> {
    let numerators = partition.value(column)?;
    let numerators = numerators.as_per_district()?;

    let mut totals: BTreeMap<u32, f64> =
        partition.district_ids().iter().map(|&district| (district, 0.0)).collect();
    for other in columns {
        let tally = partition.value(other)?;
        for (&district, &votes) in tally.as_per_district()? {
            *totals.entry(district).or_insert(0.0) += votes;
        }
    }

    let shares = totals.iter()
        .map(|(&district, &total)| {
            let votes = numerators.get(&district).copied().unwrap_or(0.0);
            (district, votes / total)
        })
        .collect::<BTreeMap<_, _>>();
    Ok(Rc::new(StatValue::PerDistrict(shares)))
}

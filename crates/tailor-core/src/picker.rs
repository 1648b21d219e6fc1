//! Assembly of the selection prompt's rows.
//!
//! The base item always comes first. Remaining rows are sorted with a stale
//! (no longer available) selection on top, then alphabetically by label.
//! Display names are not unique across accounts, so clashing names get an
//! account (or profile) suffix.
//!
//! Without a listing (`None`) nothing can be judged stale, so the current
//! selection is shown as a plain row.

use crate::availability::is_selected_customization_available;
use crate::core_types::{base_customization, Customization, PickerItem};
use std::collections::{HashMap, HashSet};

pub const INVALID_SELECTION_DETAIL: &str = "This customization is no longer available";

pub fn build_picker_items(
    available: Option<&[Customization]>,
    persisted: &[Customization],
    selected: &Customization,
) -> Vec<PickerItem> {
    let listed = available.is_some();
    let available: &[Customization] = match available {
        Some(available) => available,
        None if selected.is_base() => &[],
        None => std::slice::from_ref(selected),
    };

    let mut name_counts: HashMap<&str, usize> = HashMap::new();
    for customization in available {
        *name_counts.entry(customization.name.as_str()).or_insert(0) += 1;
    }
    let known: HashSet<&str> = persisted.iter().map(|c| c.identifier.as_str()).collect();

    let mut items: Vec<PickerItem> = available
        .iter()
        .filter(|c| !c.is_base())
        .map(|c| {
            let clashes = name_counts.get(c.name.as_str()).copied().unwrap_or(0) > 1;
            PickerItem {
                label: item_label(c, clashes),
                description: c.description.clone(),
                detail: c
                    .scope
                    .as_ref()
                    .map(|s| format!("Profile: {}", s.name))
                    .unwrap_or_default(),
                customization: c.clone(),
                is_new: listed && !known.contains(c.identifier.as_str()),
                recently_used: c.identifier == selected.identifier,
                invalid_selection: false,
            }
        })
        .collect();

    if listed && !is_selected_customization_available(selected, available) {
        items.push(PickerItem {
            label: selected.name.clone(),
            description: selected.description.clone(),
            detail: INVALID_SELECTION_DETAIL.to_string(),
            customization: selected.clone(),
            is_new: false,
            recently_used: true,
            invalid_selection: true,
        });
    }

    items.sort_by(|a, b| {
        b.invalid_selection
            .cmp(&a.invalid_selection)
            .then_with(|| a.label.cmp(&b.label))
    });

    let base = base_customization();
    let mut result = Vec::with_capacity(items.len() + 1);
    result.push(PickerItem {
        label: base.name.clone(),
        description: base.description.clone(),
        detail: String::new(),
        recently_used: selected.is_base(),
        customization: base,
        is_new: false,
        invalid_selection: false,
    });
    result.extend(items);
    result
}

fn item_label(customization: &Customization, clashes: bool) -> String {
    if clashes {
        format!("{} ({})", customization.name, customization.disambiguation_marker())
    } else {
        customization.name.clone()
    }
}

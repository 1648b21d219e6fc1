//! Set arithmetic over customization lists, by identifier.

use crate::core_types::Customization;
use std::collections::HashSet;

/// Elements of `available` whose identifier does not appear in `persisted`,
/// in `available` order.
pub fn get_new_customizations(
    available: &[Customization],
    persisted: &[Customization],
) -> Vec<Customization> {
    let known: HashSet<&str> = persisted.iter().map(|c| c.identifier.as_str()).collect();
    available
        .iter()
        .filter(|c| !known.contains(c.identifier.as_str()))
        .cloned()
        .collect()
}

/// The base customization (empty identifier) is always available.
pub fn is_selected_customization_available(
    selected: &Customization,
    available: &[Customization],
) -> bool {
    selected.identifier.is_empty() || available.iter().any(|c| c.identifier == selected.identifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::base_customization;

    fn ids(list: &[Customization]) -> Vec<&str> {
        list.iter().map(|c| c.identifier.as_str()).collect()
    }

    #[test]
    fn test_new_customizations_scenario() {
        let available = vec![Customization::new("A", "Alpha"), Customization::new("B", "Beta")];
        let persisted = vec![Customization::new("A", "Alpha")];

        assert_eq!(ids(&get_new_customizations(&available, &persisted)), vec!["B"]);
    }

    #[test]
    fn test_new_customizations_empty_when_sets_equal() {
        let available = vec![Customization::new("A", "Alpha"), Customization::new("B", "Beta")];
        let persisted = vec![Customization::new("B", "Renamed"), Customization::new("A", "Alpha")];

        assert!(get_new_customizations(&available, &persisted).is_empty());
    }

    #[test]
    fn test_new_customizations_preserve_available_order() {
        let available = vec![
            Customization::new("D", "Delta"),
            Customization::new("A", "Alpha"),
            Customization::new("C", "Gamma"),
        ];
        let persisted = vec![Customization::new("A", "Alpha")];

        assert_eq!(ids(&get_new_customizations(&available, &persisted)), vec!["D", "C"]);
    }

    #[test]
    fn test_everything_is_new_without_snapshot() {
        let available = vec![Customization::new("A", "Alpha")];
        assert_eq!(get_new_customizations(&available, &[]).len(), 1);
    }

    #[test]
    fn test_base_is_always_available() {
        assert!(is_selected_customization_available(&base_customization(), &[]));
        assert!(is_selected_customization_available(
            &Customization::new("", "anything"),
            &[Customization::new("Y", "Yankee")]
        ));
    }

    #[test]
    fn test_missing_selection_is_unavailable() {
        let selected = Customization::new("X", "X-ray");
        let available = vec![Customization::new("Y", "Yankee")];
        assert!(!is_selected_customization_available(&selected, &available));
        assert!(is_selected_customization_available(&selected, &[Customization::new("X", "X-ray")]));
    }
}

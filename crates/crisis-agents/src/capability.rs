//! Which agent kinds may perform which actions, and what they cost.

use crisis_types::{ActionName, AgentKind, Resource};

/// `(action, kind allowed to perform it, resource spent per use)`.
const CAPABILITIES: [(ActionName, AgentKind, Option<Resource>); 6] = [
    (ActionName::PickupSurvivor, AgentKind::Medic, None),
    (ActionName::DropAtHospital, AgentKind::Medic, None),
    (ActionName::ExtinguishFire, AgentKind::Truck, Some(Resource::Water)),
    (ActionName::ClearRubble, AgentKind::Truck, Some(Resource::Tools)),
    (ActionName::Recharge, AgentKind::Drone, None),
    (ActionName::Resupply, AgentKind::Truck, None),
];

/// Whether an agent of `kind` may perform `action`.
pub fn can_perform(action: ActionName, kind: AgentKind) -> bool {
    CAPABILITIES
        .iter()
        .any(|&(a, k, _)| a == action && k == kind)
}

/// The resource spent by one use of `action`, if any.
pub fn cost(action: ActionName) -> Option<Resource> {
    CAPABILITIES
        .iter()
        .find(|&&(a, _, _)| a == action)
        .and_then(|&(_, _, r)| r)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_action_has_exactly_one_kind() {
        let kinds = [AgentKind::Medic, AgentKind::Truck, AgentKind::Drone];
        for action in ActionName::ALL {
            let n = kinds.iter().filter(|&&k| can_perform(action, k)).count();
            assert_eq!(n, 1, "{action}");
        }
    }

    #[test]
    fn table_matches_roles() {
        assert!(can_perform(ActionName::PickupSurvivor, AgentKind::Medic));
        assert!(!can_perform(ActionName::PickupSurvivor, AgentKind::Truck));
        assert!(can_perform(ActionName::Resupply, AgentKind::Truck));
        assert!(!can_perform(ActionName::Resupply, AgentKind::Drone));
        assert!(can_perform(ActionName::Recharge, AgentKind::Drone));
    }

    #[test]
    fn costs_are_gauges_the_performer_carries() {
        for &(action, kind, cost) in &CAPABILITIES {
            if let Some(resource) = cost {
                assert!(crate::resources::default_carries(kind, resource), "{action}");
            }
        }
    }

    #[test]
    fn costs() {
        assert_eq!(cost(ActionName::ExtinguishFire), Some(Resource::Water));
        assert_eq!(cost(ActionName::ClearRubble), Some(Resource::Tools));
        assert_eq!(cost(ActionName::PickupSurvivor), None);
    }
}

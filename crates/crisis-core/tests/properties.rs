//! Property tests: world invariants hold under arbitrary command sequences.

#![allow(clippy::unwrap_used)]

use crisis_agents::AgentParams;
use crisis_core::config::{HospitalConfig, SimulationConfig, SurvivorConfig};
use crisis_core::world::WorldState;
use crisis_types::{
    ActionName, AgentKind, Command, Plan, Position, Resource, SurvivorId, SurvivorStatus,
};
use proptest::prelude::*;

fn config() -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.world.width = 6;
    config.world.height = 6;
    config.world.max_ticks = 40;
    config.world.seed = 7;
    config.agents.roster = vec![
        AgentParams::new("1", AgentKind::Medic, Position::new(1, 1)),
        AgentParams::new("2", AgentKind::Medic, Position::new(4, 4)),
        AgentParams::new("3", AgentKind::Truck, Position::new(2, 3)),
        AgentParams {
            battery: Some(3),
            ..AgentParams::new("4", AgentKind::Drone, Position::new(0, 0))
        },
    ];
    config.hospitals = vec![HospitalConfig {
        pos: Position::new(3, 3),
        capacity: 1,
    }];
    config.survivors.placed = vec![
        SurvivorConfig {
            pos: Position::new(1, 2),
            deadline: 25,
        },
        SurvivorConfig {
            pos: Position::new(4, 3),
            deadline: 8,
        },
        SurvivorConfig {
            pos: Position::new(2, 2),
            deadline: 30,
        },
    ];
    config.hazards.initial_fires = vec![Position::new(5, 5)];
    config.hazards.rubble = vec![Position::new(2, 4)];
    config.hazards.spread_chance_percent = 30;
    config
}

fn command() -> impl Strategy<Value = Command> {
    let agent = prop::sample::select(vec!["1", "2", "3", "4", "9"]);
    let moves = (agent.clone(), -1..8_i32, -1..8_i32)
        .prop_map(|(id, x, y)| Command::move_to(id, Position::new(x, y)));
    let acts = (agent, prop::sample::select(ActionName::ALL.to_vec()))
        .prop_map(|(id, action)| Command::act(id, action));
    prop_oneof![moves, acts]
}

fn plans() -> impl Strategy<Value = Vec<Plan>> {
    prop::collection::vec(prop::collection::vec(command(), 0..6).prop_map(Plan::new), 1..30)
}

const fn rank(status: SurvivorStatus) -> u8 {
    match status {
        SurvivorStatus::Waiting => 0,
        SurvivorStatus::Carried => 1,
        SurvivorStatus::Rescued | SurvivorStatus::Dead => 2,
    }
}

proptest! {
    #[test]
    fn invariants_hold_under_random_plans(plans in plans()) {
        let mut world = WorldState::new(&config()).unwrap();
        let mut previous: Vec<SurvivorStatus> =
            world.survivors().iter().map(|s| s.status()).collect();

        for plan in &plans {
            if !world.is_running() {
                break;
            }
            let summary = world.apply(plan).unwrap();
            prop_assert_eq!(summary.outcomes.len(), plan.len());

            for (survivor, before) in world.survivors().iter().zip(&previous) {
                let after = survivor.status();
                prop_assert!(rank(after) >= rank(*before));
                if before.is_resolved() {
                    prop_assert_eq!(after, *before);
                }
            }
            previous = world.survivors().iter().map(|s| s.status()).collect();

            for hospital in world.hospitals() {
                prop_assert!(hospital.patient_count() <= hospital.capacity());
            }
            for agent in world.agents() {
                prop_assert!(world.grid().contains(agent.pos));
                for resource in [Resource::Battery, Resource::Water, Resource::Tools] {
                    if let Some(gauge) = agent.gauge(resource) {
                        prop_assert!(gauge.current() <= gauge.max());
                    }
                }
                if let Some(carried) = agent.carrying {
                    let survivor = world.survivor(carried).unwrap();
                    prop_assert_eq!(survivor.status(), SurvivorStatus::Carried);
                    prop_assert_eq!(survivor.pos, agent.pos);
                }
            }
            for survivor in world.summarize().survivors {
                let s = world.survivor(survivor.id).unwrap();
                prop_assert_eq!(s.status(), SurvivorStatus::Waiting);
            }
        }

        let report = world.metrics_report();
        prop_assert!(report.rescued.saturating_add(report.deaths) <= report.total_survivors);
        prop_assert!(world.survivor(SurvivorId(0)).is_some());
    }
}

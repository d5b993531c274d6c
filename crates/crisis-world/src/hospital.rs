//! Hospital triage: bounded beds plus an unbounded waiting queue.
//!
//! # Invariants
//!
//! - `patients.len() <= capacity` at every point, including mid-call.
//! - Nobody is dropped: every admitted survivor is either in a bed, in the
//!   queue, or returned by a discharge call.
//! - Every `admit` that lands in the queue bumps `overflow_events`, even
//!   when the queue drains and refills between calls.

use std::collections::VecDeque;

use crisis_types::{HospitalView, Position, SurvivorId, TriagePolicy};
use tracing::debug;

use crate::error::WorldError;

/// A survivor handed to a hospital.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Patient {
    /// Which survivor.
    pub survivor: SurvivorId,
    /// Remaining deadline when delivered. Used by the `deadline` policy.
    pub deadline: u32,
}

/// An occupied bed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Bed {
    patient: Patient,
    admitted_at: u64,
}

/// A hospital with a fixed number of beds.
#[derive(Debug, Clone)]
pub struct Hospital {
    pos: Position,
    capacity: usize,
    policy: TriagePolicy,
    patients: VecDeque<Bed>,
    queue: VecDeque<Patient>,
    overflow_events: u32,
}

impl Hospital {
    /// Create an empty hospital. Zero capacity is a configuration error.
    pub fn new(pos: Position, capacity: u32, policy: TriagePolicy) -> Result<Self, WorldError> {
        if capacity == 0 {
            return Err(WorldError::ZeroCapacity { pos });
        }
        let capacity = usize::try_from(capacity).unwrap_or(usize::MAX);
        Ok(Self {
            pos,
            capacity,
            policy,
            patients: VecDeque::new(),
            queue: VecDeque::new(),
            overflow_events: 0,
        })
    }

    /// Hospital cell.
    pub const fn pos(&self) -> Position {
        self.pos
    }

    /// Number of beds.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Survivors in beds, earliest admitted first.
    pub fn patients(&self) -> impl Iterator<Item = SurvivorId> + '_ {
        self.patients.iter().map(|b| b.patient.survivor)
    }

    /// Survivors waiting for a bed, in arrival order.
    pub fn queued(&self) -> impl Iterator<Item = SurvivorId> + '_ {
        self.queue.iter().map(|p| p.survivor)
    }

    /// Occupied beds.
    pub fn patient_count(&self) -> usize {
        self.patients.len()
    }

    /// Queue length.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Number of admissions that were deferred to the queue.
    pub const fn overflow_events(&self) -> u32 {
        self.overflow_events
    }

    fn has_room(&self) -> bool {
        self.patients.len() < self.capacity
    }

    /// Admit a patient at tick `now`.
    ///
    /// Returns `true` when the patient got a bed. When every bed is taken
    /// the patient joins the queue, the overflow counter is incremented,
    /// and `false` is returned. A full hospital is not an error.
    pub fn admit(&mut self, patient: Patient, now: u64) -> bool {
        if self.has_room() {
            self.patients.push_back(Bed {
                patient,
                admitted_at: now,
            });
            return true;
        }
        self.queue.push_back(patient);
        self.overflow_events = self.overflow_events.saturating_add(1);
        debug!(
            hospital = %self.pos,
            survivor = %patient.survivor,
            queue = self.queue.len(),
            "hospital full, patient queued"
        );
        false
    }

    /// Remove and return the earliest-admitted patient.
    pub fn discharge(&mut self) -> Option<Patient> {
        self.patients.pop_front().map(|bed| bed.patient)
    }

    /// Discharge every patient whose treatment has run `treatment_ticks`
    /// ticks by `now`, then refill the freed beds from the queue.
    ///
    /// Beds are admitted in tick order, so only the front of the list needs
    /// checking. Returns the discharged patients.
    pub fn discharge_finished(&mut self, now: u64, treatment_ticks: u64) -> Vec<Patient> {
        let mut discharged = Vec::new();
        while let Some(front) = self.patients.front() {
            if front.admitted_at.saturating_add(treatment_ticks) > now {
                break;
            }
            if let Some(patient) = self.discharge() {
                discharged.push(patient);
            }
        }
        if !discharged.is_empty() {
            self.process_queue(now);
        }
        discharged
    }

    /// Promote queued patients into free beds according to the policy.
    ///
    /// Returns how many were promoted.
    pub fn process_queue(&mut self, now: u64) -> usize {
        let mut promoted: usize = 0;
        while self.has_room() {
            let Some(patient) = self.next_candidate() else {
                break;
            };
            self.patients.push_back(Bed {
                patient,
                admitted_at: now,
            });
            promoted = promoted.saturating_add(1);
        }
        promoted
    }

    /// Remove the next patient to promote, per policy.
    fn next_candidate(&mut self) -> Option<Patient> {
        match self.policy {
            TriagePolicy::Fifo => self.queue.pop_front(),
            TriagePolicy::Deadline => {
                // min_by_key keeps the first of equal keys.
                let idx = self
                    .queue
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, p)| p.deadline)
                    .map(|(i, _)| i)?;
                self.queue.remove(idx)
            }
        }
    }

    /// Planner-visible projection.
    pub fn view(&self) -> HospitalView {
        HospitalView {
            pos: self.pos,
            capacity: u32::try_from(self.capacity).unwrap_or(u32::MAX),
            patients: u32::try_from(self.patients.len()).unwrap_or(u32::MAX),
            queue: u32::try_from(self.queue.len()).unwrap_or(u32::MAX),
        }
    }
}

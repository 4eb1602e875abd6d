//! Wait-time formulas.
//!
//! Booking, the live status query and the running-late broadcast each have
//! their own formula. They differ in consultation length and rank base.

use std::num::NonZeroU32;

use doctor_cell::DoctorStatus;

use crate::models::WaitEstimate;

/// Fixed consultation slot used by the live query and the running-late broadcast.
pub const CONSULTATION_DURATION_MINUTES: u32 = 20;

/// Extra wait added while a doctor is running late.
pub const RUNNING_LATE_DELAY_MINUTES: u32 = 10;

pub fn doctor_delay(status: DoctorStatus) -> u32 {
    match status {
        DoctorStatus::RunningLate => RUNNING_LATE_DELAY_MINUTES,
        DoctorStatus::OnTime | DoctorStatus::OnBreak => 0,
    }
}

/// Estimate returned when booking: `(queue_number - 1) * average + delay`,
/// except that the first in line is always available now.
pub fn booking_wait(
    queue_number: u32,
    average_consultation_time: NonZeroU32,
    status: DoctorStatus,
) -> WaitEstimate {
    if queue_number <= 1 {
        return WaitEstimate::AvailableNow;
    }

    let minutes = (queue_number - 1)
        .saturating_mul(average_consultation_time.get())
        .saturating_add(doctor_delay(status));
    WaitEstimate::Minutes(minutes)
}

/// Estimate for the live status query. `position` is 1-based.
pub fn live_wait(position: u32, status: DoctorStatus) -> WaitEstimate {
    let delay = doctor_delay(status);
    if position <= 1 && delay == 0 {
        return WaitEstimate::AvailableNow;
    }

    let minutes = position
        .saturating_sub(1)
        .saturating_mul(CONSULTATION_DURATION_MINUTES)
        .saturating_add(delay);
    WaitEstimate::Minutes(minutes)
}

/// Wait pushed to each active appointment when the doctor starts running late.
/// `rank` is 0-based, so the head of the queue still gets the delay.
pub fn running_late_wait(rank: usize) -> WaitEstimate {
    let rank = u32::try_from(rank).unwrap_or(u32::MAX);
    WaitEstimate::Minutes(
        rank.saturating_mul(CONSULTATION_DURATION_MINUTES)
            .saturating_add(RUNNING_LATE_DELAY_MINUTES),
    )
}

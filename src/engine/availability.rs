use chrono::{Days, NaiveDate};

use crate::limits::*;
use crate::model::*;

use super::conflict::find_conflicts;
use super::error::{BookingRejection, Violation};

// ── Validation & Pricing ──────────────────────────────────────────

/// Validate a booking request against an apartment snapshot and its
/// active bookings, and price the stay.
///
/// Pure function of its inputs: no I/O, no hidden state, no clock reads
/// (`today` is injected). All checks run and every violation is
/// collected, so the caller gets a complete rejection report rather than
/// the first failure.
///
/// Edit flows must exclude the booking's own id from `existing` before
/// calling — the engine cannot tell a booking from its replacement.
pub fn validate_and_price(
    request: &BookingRequest,
    apartment: &ApartmentSnapshot,
    existing: &[ExistingBooking],
    today: NaiveDate,
) -> Result<PricedBooking, BookingRejection> {
    let mut rejection = BookingRejection::default();

    if !apartment.is_available {
        rejection.push(Violation::ApartmentUnavailable);
    }

    if request.guest_id == apartment.owner_id {
        rejection.push(Violation::SelfBooking);
    }

    // One-day lead time: "today" itself is not bookable.
    let earliest_start = today + Days::new(1);
    if request.start_date < earliest_start {
        rejection.push(Violation::StartDateInPast);
    }

    let range_ok = request.end_date > request.start_date;
    if !range_ok {
        rejection.push(Violation::InvalidDateRange);
    }

    if request.guests < 1 || request.guests > apartment.max_occupancy {
        rejection.push(Violation::OccupancyExceeded {
            max_occupancy: apartment.max_occupancy,
        });
    }

    if let Some(notes) = &request.special_requests {
        if notes.chars().count() > MAX_SPECIAL_REQUESTS_LEN {
            rejection.push(Violation::SpecialRequestsTooLong {
                max_len: MAX_SPECIAL_REQUESTS_LEN,
            });
        }
    }

    // Length and overlap checks only make sense on a valid range.
    if range_ok {
        let stay = DateRange::new(request.start_date, request.end_date);
        if stay.nights() > MAX_STAY_NIGHTS {
            rejection.push(Violation::StayTooLong {
                max_nights: MAX_STAY_NIGHTS,
            });
        }
        let conflicting = find_conflicts(&stay, existing);
        if !conflicting.is_empty() {
            rejection.push(Violation::DateConflict { conflicting });
        }
    }

    if !rejection.is_empty() {
        return Err(rejection);
    }

    let stay = DateRange::new(request.start_date, request.end_date);
    let nights = stay.nights();
    let total_price = (apartment.price_per_night * nights).round_2();

    Ok(PricedBooking {
        apartment_id: request.apartment_id,
        guest_id: request.guest_id,
        stay,
        guests: request.guests,
        nights,
        total_price,
        special_requests: request.special_requests.clone(),
        created_at: today,
    })
}

/// A booking may be cancelled only while its start is more than two days
/// out (48-hour lock window).
pub fn can_cancel(start_date: NaiveDate, today: NaiveDate) -> bool {
    (start_date - today).num_days() > 2
}

#[cfg(test)]
mod tests {
    use ulid::Ulid;

    use crate::money::Money;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    const TODAY: (i32, u32, u32) = (2024, 7, 1);

    fn today() -> NaiveDate {
        date(TODAY.0, TODAY.1, TODAY.2)
    }

    fn apartment() -> ApartmentSnapshot {
        ApartmentSnapshot {
            apartment_id: Ulid::new(),
            owner_id: Ulid::new(),
            max_occupancy: 4,
            price_per_night: Money::from_major(100),
            is_available: true,
        }
    }

    fn request(apartment: &ApartmentSnapshot, start: NaiveDate, end: NaiveDate) -> BookingRequest {
        BookingRequest {
            apartment_id: apartment.apartment_id,
            guest_id: Ulid::new(),
            start_date: start,
            end_date: end,
            guests: 2,
            special_requests: None,
        }
    }

    fn booked(apartment: &ApartmentSnapshot, start: NaiveDate, end: NaiveDate) -> ExistingBooking {
        ExistingBooking {
            booking_id: Ulid::new(),
            apartment_id: apartment.apartment_id,
            stay: DateRange::new(start, end),
        }
    }

    fn has(rejection: &BookingRejection, want: impl Fn(&Violation) -> bool) -> bool {
        rejection.violations.iter().any(want)
    }

    // ── happy path ────────────────────────────────────────

    #[test]
    fn valid_request_is_priced() {
        let apt = apartment();
        let req = request(&apt, date(2024, 7, 10), date(2024, 7, 15));
        let priced = validate_and_price(&req, &apt, &[], today()).unwrap();
        assert_eq!(priced.nights, 5);
        assert_eq!(priced.total_price, Money::from_major(500));
        assert_eq!(priced.created_at, today());
        assert_eq!(priced.stay, DateRange::new(date(2024, 7, 10), date(2024, 7, 15)));
    }

    #[test]
    fn validation_is_idempotent() {
        let apt = apartment();
        let req = request(&apt, date(2024, 7, 10), date(2024, 7, 15));
        let a = validate_and_price(&req, &apt, &[], today()).unwrap();
        let b = validate_and_price(&req, &apt, &[], today()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn fractional_price_total_rounds_half_even() {
        let mut apt = apartment();
        apt.price_per_night = Money::new("33.335".parse().unwrap());
        let req = request(&apt, date(2024, 7, 10), date(2024, 7, 11));
        let priced = validate_and_price(&req, &apt, &[], today()).unwrap();
        // 33.335 × 1 → 33.34 (odd neighbour below, even above)
        assert_eq!(priced.total_price, Money::from_cents(3_334));
    }

    // ── individual rules ──────────────────────────────────

    #[test]
    fn unavailable_apartment_rejected() {
        let mut apt = apartment();
        apt.is_available = false;
        let req = request(&apt, date(2024, 7, 10), date(2024, 7, 15));
        let rej = validate_and_price(&req, &apt, &[], today()).unwrap_err();
        assert!(has(&rej, |v| matches!(v, Violation::ApartmentUnavailable)));
    }

    #[test]
    fn self_booking_rejected_regardless_of_dates() {
        let apt = apartment();
        let mut req = request(&apt, date(2024, 7, 10), date(2024, 7, 15));
        req.guest_id = apt.owner_id;
        let rej = validate_and_price(&req, &apt, &[], today()).unwrap_err();
        assert_eq!(rej.violations, vec![Violation::SelfBooking]);
    }

    #[test]
    fn start_today_rejected_start_tomorrow_accepted() {
        let apt = apartment();

        let req = request(&apt, today(), date(2024, 7, 15));
        let rej = validate_and_price(&req, &apt, &[], today()).unwrap_err();
        assert!(has(&rej, |v| matches!(v, Violation::StartDateInPast)));

        let req = request(&apt, today() + Days::new(1), date(2024, 7, 15));
        assert!(validate_and_price(&req, &apt, &[], today()).is_ok());
    }

    #[test]
    fn inverted_and_empty_ranges_rejected() {
        let apt = apartment();

        let req = request(&apt, date(2024, 7, 15), date(2024, 7, 10));
        let rej = validate_and_price(&req, &apt, &[], today()).unwrap_err();
        assert!(has(&rej, |v| matches!(v, Violation::InvalidDateRange)));

        // zero-night stay
        let req = request(&apt, date(2024, 7, 10), date(2024, 7, 10));
        let rej = validate_and_price(&req, &apt, &[], today()).unwrap_err();
        assert!(has(&rej, |v| matches!(v, Violation::InvalidDateRange)));
    }

    #[test]
    fn occupancy_boundary() {
        let apt = apartment();

        let mut req = request(&apt, date(2024, 7, 10), date(2024, 7, 15));
        req.guests = apt.max_occupancy;
        assert!(validate_and_price(&req, &apt, &[], today()).is_ok());

        req.guests = apt.max_occupancy + 1;
        let rej = validate_and_price(&req, &apt, &[], today()).unwrap_err();
        assert!(has(&rej, |v| matches!(
            v,
            Violation::OccupancyExceeded { max_occupancy: 4 }
        )));

        req.guests = 0;
        let rej = validate_and_price(&req, &apt, &[], today()).unwrap_err();
        assert!(has(&rej, |v| matches!(v, Violation::OccupancyExceeded { .. })));
    }

    #[test]
    fn stay_too_long_rejected() {
        let apt = apartment();
        let start = date(2024, 7, 10);
        let req = request(&apt, start, start + Days::new(MAX_STAY_NIGHTS as u64 + 1));
        let rej = validate_and_price(&req, &apt, &[], today()).unwrap_err();
        assert!(has(&rej, |v| matches!(v, Violation::StayTooLong { .. })));

        let req = request(&apt, start, start + Days::new(MAX_STAY_NIGHTS as u64));
        assert!(validate_and_price(&req, &apt, &[], today()).is_ok());
    }

    #[test]
    fn oversized_special_requests_rejected() {
        let apt = apartment();
        let mut req = request(&apt, date(2024, 7, 10), date(2024, 7, 15));
        req.special_requests = Some("x".repeat(MAX_SPECIAL_REQUESTS_LEN + 1));
        let rej = validate_and_price(&req, &apt, &[], today()).unwrap_err();
        assert!(has(&rej, |v| matches!(
            v,
            Violation::SpecialRequestsTooLong { .. }
        )));
    }

    // ── overlap rule ──────────────────────────────────────

    #[test]
    fn touching_boundary_does_not_conflict() {
        let apt = apartment();
        let existing = [booked(&apt, date(2024, 7, 10), date(2024, 7, 15))];

        // checks in the day the other guest checks out
        let req = request(&apt, date(2024, 7, 15), date(2024, 7, 18));
        let priced = validate_and_price(&req, &apt, &existing, today()).unwrap();
        assert_eq!(priced.nights, 3);
        assert_eq!(priced.total_price, Money::from_major(300));
    }

    #[test]
    fn overlapping_stay_conflicts_with_id() {
        let apt = apartment();
        let existing = [booked(&apt, date(2024, 7, 10), date(2024, 7, 15))];

        let req = request(&apt, date(2024, 7, 14), date(2024, 7, 16));
        let rej = validate_and_price(&req, &apt, &existing, today()).unwrap_err();
        assert_eq!(
            rej.conflicting_ids().unwrap(),
            &[existing[0].booking_id][..]
        );
    }

    #[test]
    fn all_conflicting_ids_are_reported() {
        let apt = apartment();
        let existing = [
            booked(&apt, date(2024, 7, 10), date(2024, 7, 12)),
            booked(&apt, date(2024, 7, 13), date(2024, 7, 16)),
            booked(&apt, date(2024, 7, 20), date(2024, 7, 25)),
        ];

        let req = request(&apt, date(2024, 7, 11), date(2024, 7, 14));
        let rej = validate_and_price(&req, &apt, &existing, today()).unwrap_err();
        assert_eq!(
            rej.conflicting_ids().unwrap(),
            &[existing[0].booking_id, existing[1].booking_id][..]
        );
    }

    #[test]
    fn contained_stay_conflicts() {
        let apt = apartment();
        let existing = [booked(&apt, date(2024, 7, 10), date(2024, 7, 20))];
        let req = request(&apt, date(2024, 7, 12), date(2024, 7, 14));
        let rej = validate_and_price(&req, &apt, &existing, today()).unwrap_err();
        assert!(rej.conflicting_ids().is_some());
    }

    // ── violation collection ──────────────────────────────

    #[test]
    fn all_violations_reported_together() {
        let mut apt = apartment();
        apt.is_available = false;
        let mut req = request(&apt, date(2024, 7, 10), date(2024, 7, 15));
        req.guest_id = apt.owner_id;
        req.guests = 10;

        let rej = validate_and_price(&req, &apt, &[], today()).unwrap_err();
        assert_eq!(rej.violations.len(), 3);
        assert!(has(&rej, |v| matches!(v, Violation::ApartmentUnavailable)));
        assert!(has(&rej, |v| matches!(v, Violation::SelfBooking)));
        assert!(has(&rej, |v| matches!(v, Violation::OccupancyExceeded { .. })));
    }

    #[test]
    fn invalid_range_suppresses_overlap_check() {
        let apt = apartment();
        let existing = [booked(&apt, date(2024, 7, 10), date(2024, 7, 15))];
        let req = request(&apt, date(2024, 7, 14), date(2024, 7, 12));
        let rej = validate_and_price(&req, &apt, &existing, today()).unwrap_err();
        assert!(has(&rej, |v| matches!(v, Violation::InvalidDateRange)));
        assert!(rej.conflicting_ids().is_none());
    }

    // ── cancellation window ───────────────────────────────

    #[test]
    fn cancel_window_boundary() {
        assert!(!can_cancel(today(), today()));
        assert!(!can_cancel(today() + Days::new(1), today()));
        assert!(!can_cancel(today() + Days::new(2), today()));
        assert!(can_cancel(today() + Days::new(3), today()));
    }
}

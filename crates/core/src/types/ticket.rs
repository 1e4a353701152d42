//! Daily ticket numbers.
//!
//! Customers claim prepared orders by a short code such as `A07`. The
//! sequence restarts at `A01` every calendar day and runs `A01..=A99`,
//! `B01..=B99`, and so on. After `Z99` it wraps back to `A01`.
//!
//! This module holds the pure arithmetic. Persisting the counter (and making
//! the read-increment-write atomic) is the server's job.

use core::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};

/// Highest number issued under one letter.
const MAX_NUMBER: u8 = 99;

/// Persisted counter state, stored as JSON under the `ticket_counter` key.
///
/// `number` is the last number issued on `date`; `0` means nothing has been
/// issued yet under `letter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketCounter {
    pub date: NaiveDate,
    pub letter: char,
    pub number: u8,
}

impl TicketCounter {
    /// A counter that has not issued anything on `date`.
    #[must_use]
    pub const fn fresh(date: NaiveDate) -> Self {
        Self {
            date,
            letter: 'A',
            number: 0,
        }
    }

    /// Compute the counter state after issuing one ticket on `today`.
    ///
    /// A counter from another day (or a missing one) restarts at `A01`.
    /// A letter outside `A..=Z` is treated as `A`.
    #[must_use]
    pub fn advance(previous: Option<Self>, today: NaiveDate) -> Self {
        let Some(prev) = previous.filter(|c| c.date == today) else {
            return Self {
                date: today,
                letter: 'A',
                number: 1,
            };
        };

        let letter = if prev.letter.is_ascii_uppercase() {
            prev.letter
        } else {
            'A'
        };

        if prev.number < MAX_NUMBER {
            Self {
                date: today,
                letter,
                number: prev.number + 1,
            }
        } else {
            Self {
                date: today,
                letter: next_letter(letter),
                number: 1,
            }
        }
    }

    /// The code for the most recently issued ticket.
    #[must_use]
    pub const fn code(&self) -> TicketCode {
        TicketCode {
            letter: self.letter,
            number: self.number,
        }
    }
}

fn next_letter(letter: char) -> char {
    match letter {
        'Z' => 'A',
        // `letter` is ASCII uppercase, so the successor is too
        c => char::from(c as u8 + 1),
    }
}

/// A formatted ticket code, e.g. `B07`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TicketCode {
    letter: char,
    number: u8,
}

impl fmt::Display for TicketCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:02}", self.letter, self.number)
    }
}

impl Serialize for TicketCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn issue(n: usize, start: Option<TicketCounter>, today: NaiveDate) -> Vec<String> {
        let mut state = start;
        (0..n)
            .map(|_| {
                let next = TicketCounter::advance(state, today);
                state = Some(next);
                next.code().to_string()
            })
            .collect()
    }

    #[test]
    fn test_first_ticket_of_the_day_is_a01() {
        assert_eq!(issue(1, None, day(1)), vec!["A01"]);
        assert_eq!(issue(1, Some(TicketCounter::fresh(day(1))), day(1)), vec!["A01"]);
    }

    #[test]
    fn test_hundredth_ticket_rolls_to_next_letter() {
        let codes = issue(100, None, day(1));
        assert_eq!(codes.first().map(String::as_str), Some("A01"));
        assert_eq!(codes.get(98).map(String::as_str), Some("A99"));
        assert_eq!(codes.get(99).map(String::as_str), Some("B01"));
    }

    #[test]
    fn test_date_change_resets() {
        let yesterday = TicketCounter {
            date: day(1),
            letter: 'C',
            number: 42,
        };
        assert_eq!(TicketCounter::advance(Some(yesterday), day(2)).code().to_string(), "A01");
    }

    #[test]
    fn test_z99_wraps_to_a01() {
        let last = TicketCounter {
            date: day(5),
            letter: 'Z',
            number: 99,
        };
        let next = TicketCounter::advance(Some(last), day(5));
        assert_eq!(next.code().to_string(), "A01");
        assert_eq!(next.date, day(5));
    }

    #[test]
    fn test_corrupt_letter_restarts_at_a() {
        let odd = TicketCounter {
            date: day(5),
            letter: '?',
            number: 3,
        };
        assert_eq!(TicketCounter::advance(Some(odd), day(5)).code().to_string(), "A04");
    }

    #[test]
    fn test_counter_json_shape() {
        let counter = TicketCounter {
            date: day(9),
            letter: 'B',
            number: 7,
        };
        let json = serde_json::to_value(counter).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "date": "2024-03-09", "letter": "B", "number": 7 })
        );
        assert_eq!(serde_json::to_string(&counter.code()).unwrap(), "\"B07\"");
    }
}

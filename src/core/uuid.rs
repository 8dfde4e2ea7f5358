// Strict canonical UUID parsing and v7 timestamp projection.
use uuid::Uuid;

use crate::core::error::{Error, ErrorKind};

/// Parse the canonical 8-4-4-4-12 hyphenated form, case-insensitive.
/// The simple, braced, and URN renderings the `uuid` crate would happily
/// accept are rejected here; interchange admits one shape only.
pub fn parse_canonical(input: &str) -> Result<Uuid, Error> {
    if !has_canonical_shape(input) {
        return Err(Error::new(ErrorKind::Parse)
            .with_message(format!("not a canonical uuid: {input:?}")));
    }
    Uuid::parse_str(input).map_err(|err| {
        Error::new(ErrorKind::Parse)
            .with_message(format!("not a canonical uuid: {input:?}"))
            .with_source(err)
    })
}

fn has_canonical_shape(input: &str) -> bool {
    let bytes = input.as_bytes();
    if bytes.len() != 36 {
        return false;
    }
    bytes.iter().enumerate().all(|(position, byte)| match position {
        8 | 13 | 18 | 23 => *byte == b'-',
        _ => byte.is_ascii_hexdigit(),
    })
}

/// Millisecond Unix timestamp carried by time-ordered versions (v7), or
/// `None` for versions that encode no clock.
pub fn timestamp_ms(value: &Uuid) -> Option<u64> {
    let ts = value.get_timestamp()?;
    let (secs, nanos) = ts.to_unix();
    Some(secs * 1000 + u64::from(nanos) / 1_000_000)
}

pub fn timestamp_rfc3339(value: &Uuid) -> Result<Option<String>, Error> {
    use time::format_description::well_known::Rfc3339;
    let Some(ms) = timestamp_ms(value) else {
        return Ok(None);
    };
    let ts = time::OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000)
        .map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("invalid timestamp")
                .with_source(err)
        })?;
    ts.format(&Rfc3339)
        .map(Some)
        .map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("timestamp format failed")
                .with_source(err)
        })
}

#[cfg(test)]
mod tests {
    use super::{parse_canonical, timestamp_ms, timestamp_rfc3339};
    use crate::core::error::ErrorKind;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};
    use uuid::Uuid;

    #[test]
    fn parse_accepts_canonical_any_case() {
        let value = parse_canonical("67e55044-10b1-426f-9247-bb680e5fe0c8").expect("lower");
        assert_eq!(value.to_string(), "67e55044-10b1-426f-9247-bb680e5fe0c8");

        let upper = parse_canonical("67E55044-10B1-426F-9247-BB680E5FE0C8").expect("upper");
        assert_eq!(upper, value);
    }

    #[test]
    fn parse_rejects_every_other_shape() {
        let cases = [
            "not-a-valid-uuid",
            "67e5504410b1426f9247bb680e5fe0c8",
            "{67e55044-10b1-426f-9247-bb680e5fe0c8}",
            "urn:uuid:67e55044-10b1-426f-9247-bb680e5fe0c8",
            "67e55044-10b1-426f-9247-bb680e5fe0c",
            "67e55044-10b1-426f-9247-bb680e5fe0c8a",
            "67e55044x10b1-426f-9247-bb680e5fe0c8",
            "",
        ];
        for input in cases {
            let err = parse_canonical(input).expect_err(input);
            assert_eq!(err.kind(), ErrorKind::Parse, "{input}");
        }
    }

    #[test]
    fn round_trips_cover_the_constants() {
        for value in [Uuid::nil(), Uuid::max(), Uuid::new_v4(), Uuid::now_v7()] {
            assert_eq!(parse_canonical(&value.to_string()).expect("round trip"), value);
        }
    }

    #[test]
    fn byte_order_is_total_and_bounded_by_constants() {
        let mut values = vec![Uuid::nil(), Uuid::max()];
        values.extend((0..8).map(|_| Uuid::new_v4()));

        for a in &values {
            for b in &values {
                assert_eq!(a.cmp(b), b.cmp(a).reverse());
                assert_eq!(a.cmp(b), a.as_bytes().cmp(b.as_bytes()));
                for c in &values {
                    if a < b && b < c {
                        assert!(a < c);
                    }
                }
            }
        }
        for value in &values {
            assert!(Uuid::nil() <= *value);
            assert!(*value <= Uuid::max());
        }
    }

    #[test]
    fn v4_sets_version_and_variant_bits() {
        let value = Uuid::new_v4();
        assert_eq!(value.get_version_num(), 4);
        // RFC 4122 variant: top bits of byte 8 are 10.
        assert_eq!(value.as_bytes()[8] >> 6, 0b10);
    }

    #[test]
    fn v7_values_order_by_wall_clock() {
        let earlier = Uuid::now_v7();
        std::thread::sleep(Duration::from_millis(3));
        let later = Uuid::now_v7();
        assert!(earlier < later);
    }

    #[test]
    fn v7_timestamp_tracks_system_time() {
        let before = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_millis() as u64;
        let value = Uuid::now_v7();
        let after = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_millis() as u64;

        let ms = timestamp_ms(&value).expect("v7 carries a timestamp");
        assert!(ms >= before && ms <= after, "{before} <= {ms} <= {after}");

        let rendered = timestamp_rfc3339(&value).expect("format").expect("present");
        assert!(rendered.ends_with('Z'), "{rendered}");
    }

    #[test]
    fn v4_and_constants_have_no_timestamp() {
        assert_eq!(timestamp_ms(&Uuid::new_v4()), None);
        assert_eq!(timestamp_ms(&Uuid::nil()), None);
        assert_eq!(timestamp_ms(&Uuid::max()), None);
        assert_eq!(timestamp_rfc3339(&Uuid::nil()).expect("format"), None);
    }
}

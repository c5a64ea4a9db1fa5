//! BLE advertising-data name extraction.
//!
//! Advertising payloads are a sequence of length-prefixed records:
//! `[len][type][data; len-1]`, where `len` counts the type byte. The
//! device name, when present, is a "complete local name" (0x09) or
//! "shortened local name" (0x08) record. Extraction failures are
//! non-fatal: a device without a readable name is simply unnamed.

/// AD type: shortened local name.
const AD_TYPE_NAME_SHORT: u8 = 0x08;

/// AD type: complete local name.
const AD_TYPE_NAME_COMPLETE: u8 = 0x09;

/// Walk the advertising records and return the device name, if any.
///
/// Returns `None` on a missing name record, a malformed/truncated record,
/// or a name that is not valid UTF-8.
pub fn extract_local_name(adv_data: &[u8]) -> Option<String> {
    let mut offset = 0;

    while offset < adv_data.len() {
        let len = adv_data[offset] as usize;
        // A zero length terminates the record list; a record running past
        // the payload is malformed
        if len == 0 || offset + 1 + len > adv_data.len() {
            break;
        }

        let ad_type = adv_data[offset + 1];
        if ad_type == AD_TYPE_NAME_COMPLETE || ad_type == AD_TYPE_NAME_SHORT {
            if len < 2 {
                return None;
            }
            let name = &adv_data[offset + 2..offset + 1 + len];
            return std::str::from_utf8(name).ok().map(str::to_owned);
        }

        offset += len + 1;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build one AD record.
    fn record(ad_type: u8, data: &[u8]) -> Vec<u8> {
        let mut out = vec![(data.len() + 1) as u8, ad_type];
        out.extend_from_slice(data);
        out
    }

    #[test]
    fn test_complete_name() {
        let adv = record(AD_TYPE_NAME_COMPLETE, b"Thermostat");
        assert_eq!(extract_local_name(&adv).as_deref(), Some("Thermostat"));
    }

    #[test]
    fn test_short_name() {
        let adv = record(AD_TYPE_NAME_SHORT, b"Thermo");
        assert_eq!(extract_local_name(&adv).as_deref(), Some("Thermo"));
    }

    #[test]
    fn test_name_after_other_records() {
        // Flags record, then manufacturer data, then the name
        let mut adv = record(0x01, &[0x06]);
        adv.extend(record(0xFF, &[0xE5, 0x02, 0x01]));
        adv.extend(record(AD_TYPE_NAME_COMPLETE, b"Bulb"));
        assert_eq!(extract_local_name(&adv).as_deref(), Some("Bulb"));
    }

    #[test]
    fn test_no_name_record() {
        let adv = record(0x01, &[0x06]);
        assert_eq!(extract_local_name(&adv), None);
    }

    #[test]
    fn test_empty_payload() {
        assert_eq!(extract_local_name(&[]), None);
    }

    #[test]
    fn test_zero_length_terminates() {
        let mut adv = vec![0x00];
        adv.extend(record(AD_TYPE_NAME_COMPLETE, b"Hidden"));
        assert_eq!(extract_local_name(&adv), None);
    }

    #[test]
    fn test_truncated_record() {
        // Claims 10 bytes of name but the payload ends early
        let adv = vec![0x0B, AD_TYPE_NAME_COMPLETE, b'A', b'B'];
        assert_eq!(extract_local_name(&adv), None);
    }

    #[test]
    fn test_empty_name_record() {
        // A name record with no name bytes
        let adv = vec![0x01, AD_TYPE_NAME_COMPLETE];
        assert_eq!(extract_local_name(&adv), None);
    }

    #[test]
    fn test_non_utf8_name() {
        let adv = record(AD_TYPE_NAME_COMPLETE, &[0xFF, 0xFE]);
        assert_eq!(extract_local_name(&adv), None);
    }
}

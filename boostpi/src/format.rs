//! Display text formatting.

/// Formats a reading as `"<label>: <value> <unit>"`, with exactly two decimals, padded with
/// spaces to `width` characters.
///
/// The padding overwrites whatever a wider previous value left on the line, so lines can be
/// redrawn in place without clearing the display first. Text longer than `width` is returned
/// whole; cutting it is up to the display. Negative values are shown as zero.
pub fn format_reading(label: &str, value: f64, unit: &str, width: usize) -> String {
    let value = if value > 0.0 { value } else { 0.0 };
    format!("{:<width$}", format!("{}: {:.2} {}", label, value, unit), width = width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_decimals() {
        assert_eq!(format_reading("Curr", 4.641216, "psi", 0), "Curr: 4.64 psi");
        assert_eq!(format_reading("Peak", 0.0, "psi", 0), "Peak: 0.00 psi");
        assert_eq!(format_reading("Peak", 12.345678, "psi", 0), "Peak: 12.35 psi");
    }

    #[test]
    fn pads_to_width() {
        let wide = format_reading("Curr", 12.34, "psi", 16);
        let narrow = format_reading("Curr", 9.87, "psi", 16);
        assert_eq!(wide, "Curr: 12.34 psi ");
        assert_eq!(narrow, "Curr: 9.87 psi  ");
        assert_eq!(wide.len(), narrow.len());
    }

    #[test]
    fn longer_than_width_is_kept() {
        assert_eq!(format_reading("Curr", 123.45, "psi", 16), "Curr: 123.45 psi");
        assert_eq!(format_reading("Curr", 1234.5, "psi", 16), "Curr: 1234.50 psi");
    }

    #[test]
    fn never_negative() {
        assert_eq!(format_reading("Curr", -0.0, "psi", 0), "Curr: 0.00 psi");
        assert_eq!(format_reading("Curr", -3.2, "psi", 0), "Curr: 0.00 psi");
    }
}

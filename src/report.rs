//! Console renderings of request results.
use crate::profile::ProfileSummary;
use std::fmt;

/// The body of a single-shot request between its sentinel lines.
pub struct BodyReport<'a>(pub &'a str);

impl fmt::Display for BodyReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, ":::Response Body:::")?;
        writeln!(f, "{}", self.0)?;
        writeln!(f, ":::End of Response Body:::")
    }
}

pub struct ProfileReport<'a> {
    pub url: &'a str,
    pub summary: &'a ProfileSummary,
}

impl fmt::Display for ProfileReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = self.summary;
        writeln!(f, "Profile")?;
        writeln!(f, "{}", self.url)?;
        writeln!(f, "Number of Requests: {}", s.count)?;
        writeln!(f, "Fastest Time:  {} ms", s.fastest_millis)?;
        writeln!(f, "Slowest Time: {} ms", s.slowest_millis)?;
        writeln!(f, "Mean Time: {} ms", s.mean_millis)?;
        writeln!(f, "Median Time: {} ms", s.median_millis)?;
        writeln!(f, "Smallest Response: {} bytes", s.smallest_bytes)?;
        writeln!(f, "Largest Response: {} bytes", s.largest_bytes)?;
        writeln!(f, "Request Success: {:.0} % ", s.success_percent)?;
        writeln!(f, "Error Codes: [{}]", s.error_codes.join(" "))
    }
}

#[cfg(test)]
mod report_tests {
    use super::*;

    #[test]
    fn body_between_sentinels() {
        assert_eq!(
            BodyReport("<p>hi</p>").to_string(),
            ":::Response Body:::\n<p>hi</p>\n:::End of Response Body:::\n"
        );
    }

    #[test]
    fn profile_layout() {
        let summary = ProfileSummary {
            count: 3,
            fastest_millis: 10,
            slowest_millis: 50,
            mean_millis: 30,
            median_millis: 30,
            smallest_bytes: 100,
            largest_bytes: 200,
            success_percent: 2.0 / 3.0 * 100.0,
            error_codes: vec!["".into(), "404".into(), "".into()],
        };
        let report = ProfileReport {
            url: "https://example.com/links",
            summary: &summary,
        };
        assert_eq!(
            report.to_string(),
            "Profile\n\
             https://example.com/links\n\
             Number of Requests: 3\n\
             Fastest Time:  10 ms\n\
             Slowest Time: 50 ms\n\
             Mean Time: 30 ms\n\
             Median Time: 30 ms\n\
             Smallest Response: 100 bytes\n\
             Largest Response: 200 bytes\n\
             Request Success: 67 % \n\
             Error Codes: [ 404 ]\n"
        );
    }
}

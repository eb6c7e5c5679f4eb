/// The recording surface handed to application code.
///
/// Recording is fire-and-forget: none of these methods can fail and none of
/// them wait on the network. `rate` is accepted for compatibility with
/// statsd-style callers and ignored; every call is recorded.
pub trait MetricsRecorder: Send + Sync {
    /// Record an instantaneous value.
    fn gauge(&self, name: &str, value: f64, tags: &[&str], rate: f64);

    /// Record a value whose distribution matters.
    fn histogram(&self, name: &str, value: f64, tags: &[&str], rate: f64);

    /// Record how long something took, in milliseconds.
    fn time_in_milliseconds(&self, name: &str, value: f64, tags: &[&str], rate: f64);

    /// Record an occurrence count.
    fn count(&self, name: &str, value: i64, tags: &[&str], rate: f64);
}

pub(crate) fn owned_tags(tags: &[&str]) -> Vec<String> {
    tags.iter().map(|t| (*t).to_string()).collect()
}

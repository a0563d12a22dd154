use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Progress {
    SearchStart {
        search: usize,
        total: usize,
        start: String,
        distance: f64,
    },
    Round {
        search: usize,
        iteration: usize,
        sequence: String,
        distance: f64,
        step_size: f64,
        elapsed: Duration,
    },
    SearchFinish {
        search: usize,
        iterations: usize,
        distance: f64,
    },

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn report_without_callback_is_a_no_op() {
        ProgressReporter::new().report(Progress::Message("ignored".to_string()));
    }

    #[test]
    fn report_forwards_events_to_callback() {
        let seen = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::Message(msg) = event {
                seen.lock().unwrap().push(msg);
            }
        }));
        reporter.report(Progress::Message("hello".to_string()));
        drop(reporter);
        assert_eq!(seen.into_inner().unwrap(), vec!["hello".to_string()]);
    }
}

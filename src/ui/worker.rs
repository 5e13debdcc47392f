//! Background thread that runs API requests so the event loop never blocks.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use anyhow::{anyhow, Context, Result};
use log::{debug, error};

use crate::api::{ContactService, Request, Response, Transport};

/// A request tagged with the ticket the App expects back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub ticket: u64,
    pub key: String,
    pub request: Request,
}

#[derive(Debug)]
pub struct Done {
    pub ticket: u64,
    pub response: Response,
}

pub struct Worker {
    jobs: Sender<Job>,
    done: Receiver<Done>,
}

impl Worker {
    pub fn spawn<T>(service: ContactService<T>) -> Result<Self>
    where
        T: Transport + Send + 'static,
    {
        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let (done_tx, done_rx) = mpsc::channel::<Done>();

        thread::Builder::new()
            .name("contactbook-api".into())
            .spawn(move || {
                for job in job_rx {
                    debug!("worker running ticket {}", job.ticket);
                    let response = service.execute(&job.key, job.request);
                    if done_tx
                        .send(Done {
                            ticket: job.ticket,
                            response,
                        })
                        .is_err()
                    {
                        break;
                    }
                }
                debug!("worker stopped");
            })
            .context("failed to spawn API worker thread")?;

        Ok(Self {
            jobs: job_tx,
            done: done_rx,
        })
    }

    pub fn submit(&self, job: Job) -> Result<()> {
        self.jobs
            .send(job)
            .map_err(|_| anyhow!("API worker is no longer running"))
    }

    /// Next finished job, if any, without blocking.
    pub fn poll(&self) -> Result<Option<Done>> {
        match self.done.try_recv() {
            Ok(done) => Ok(Some(done)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                error!("API worker disconnected");
                Err(anyhow!("API worker is no longer running"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use url::Url;

    use super::*;
    use crate::api::{ApiError, HttpResponse, KeyStatus, MultipartBody};

    struct Always(&'static str);

    impl Transport for Always {
        fn get(&self, _url: &Url) -> Result<HttpResponse, ApiError> {
            Ok(HttpResponse {
                status: 200,
                body: self.0.to_string(),
            })
        }

        fn post_multipart(&self, _url: &Url, _body: MultipartBody) -> Result<HttpResponse, ApiError> {
            self.get(&Url::parse("http://unused.test/").unwrap())
        }
    }

    #[test]
    fn test_worker_returns_ticketed_responses() {
        let service = ContactService::new(
            Always("1"),
            Url::parse("http://api.test/").unwrap(),
            Url::parse("http://avatars.test/").unwrap(),
        );
        let worker = Worker::spawn(service).unwrap();
        worker
            .submit(Job {
                ticket: 7,
                key: String::new(),
                request: Request::ValidateKey("me@example.com".into()),
            })
            .unwrap();

        let mut done = None;
        for _ in 0..200 {
            if let Some(d) = worker.poll().unwrap() {
                done = Some(d);
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        let done = done.expect("worker answered");
        assert_eq!(done.ticket, 7);
        match done.response {
            Response::KeyValidated { key, result } => {
                assert_eq!(key, "me@example.com");
                assert_eq!(result.unwrap(), KeyStatus::Valid);
            }
            other => panic!("unexpected response {other:?}"),
        }
    }
}

use std::io::{self, Write};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread::{self, JoinHandle};

use log::{debug, error};

use super::observation::Observation;

#[derive(Debug, Clone)]
pub enum Message {
    Publish(Observation),
    Break,
}

/// Hands observations to the logging host on its own thread, one JSON object per line.
pub struct Publisher {
    tx: Option<SyncSender<Message>>,
    thread_handler: Option<JoinHandle<()>>,
}

/// Observations waiting for a slow writer before new ones are dropped.
const QUEUE_DEPTH: usize = 4;

impl Publisher {
    pub fn new() -> Publisher {
        Publisher {
            tx: None,
            thread_handler: None,
        }
    }

    pub fn start_thread(&mut self, sink: Box<dyn Write + Send>) {
        if self.thread_handler.is_some() {
            return;
        }

        let (tx, rx) = mpsc::sync_channel(QUEUE_DEPTH);
        let thread_handler = thread::spawn(move || thread_loop(rx, sink));

        self.tx = Some(tx);
        self.thread_handler = Some(thread_handler);
    }

    pub fn get_tx(&self) -> Option<SyncSender<Message>> {
        self.tx.clone()
    }

    /// Asks the thread to finish the queue and waits for it.
    pub fn stop(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Message::Break);
        }
        if let Some(handle) = self.thread_handler.take() {
            if handle.join().is_err() {
                error!("publisher thread panicked");
            }
        }
    }
}

fn thread_loop(rx: Receiver<Message>, mut sink: Box<dyn Write + Send>) {
    //ends on Break or once every sender is gone
    while let Ok(message) = rx.recv() {
        let observation = match message {
            Message::Publish(observation) => observation,
            Message::Break => break,
        };

        match write_line(&mut sink, &observation) {
            Ok(()) => debug!("published observation {}", observation.date_time),
            Err(err) => error!("can't publish observation {}: {}", observation.date_time, err),
        }
    }
}

pub fn write_line(sink: &mut dyn Write, observation: &Observation) -> io::Result<()> {
    serde_json::to_writer(&mut *sink, observation)?;
    sink.write_all(b"\n")?;
    sink.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writes_one_line_per_observation() {
        let buffer = SharedBuffer::default();
        let mut publisher = Publisher::new();
        publisher.start_thread(Box::new(buffer.clone()));

        let tx = publisher.get_tx().unwrap();
        tx.send(Message::Publish(Observation::new(10))).unwrap();
        tx.send(Message::Publish(Observation::new(11))).unwrap();
        drop(tx);
        publisher.stop();

        let output = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("{\"dateTime\":10,"));
        assert!(lines[1].starts_with("{\"dateTime\":11,"));
    }
}

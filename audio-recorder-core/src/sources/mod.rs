pub mod queued;

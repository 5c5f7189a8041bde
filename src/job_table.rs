//! The fixed-capacity table of jobs shared by the launcher, the builtins and the reaper.
//!
//! The table itself knows nothing about signals. Callers keep it consistent with respect to
//! asynchronous events by only applying those events at safe points (see `proc`), and by holding
//! a [`crate::signal::SignalBlock`] across fork and registration.

use crate::flog::FLOG;
use crate::proc::Pid;
use std::fmt;
use std::num::NonZeroU32;

/// The number of slots in the default table.
pub const MAX_JOBS: usize = 16;

/// The largest job id handed out before wrapping back to 1.
pub const MAX_JOB_ID: u32 = 1 << 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobState {
    /// The job the shell is waiting for. At most one job is in this state.
    Foreground,
    /// Running without the shell waiting for it.
    Background,
    /// Stopped by a job control signal.
    Stopped,
}

impl JobState {
    /// The label used in the job list.
    pub fn label(self) -> &'static str {
        match self {
            JobState::Foreground => "Foreground",
            JobState::Background => "Running",
            JobState::Stopped => "Stopped",
        }
    }
}

/// A small positive job number, as written after `%`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(NonZeroU32);

impl JobId {
    /// Return None for anything that cannot be a job id, i.e. anything below 1 or too large.
    pub fn new(id: i64) -> Option<JobId> {
        u32::try_from(id)
            .ok()
            .filter(|&id| id <= MAX_JOB_ID)
            .and_then(NonZeroU32::new)
            .map(JobId)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.get(), f)
    }
}

/// One tracked process group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Job {
    pid: Pid,
    job_id: JobId,
    state: JobState,
    command_line: String,
}

impl Job {
    /// The pid of the group leader, which is also the process group id.
    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// The input line this job was launched from.
    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    pub fn is_foreground(&self) -> bool {
        self.state == JobState::Foreground
    }

    pub fn is_stopped(&self) -> bool {
        self.state == JobState::Stopped
    }
}

/// The job list line: `[<job_id>] (<pid>) <State> <command_line>`.
impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] ({}) {} {}",
            self.job_id,
            self.pid,
            self.state.label(),
            self.command_line
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddJobError {
    /// The pid was below 1.
    InvalidPid,
    /// Every slot is occupied.
    TooManyJobs,
}

impl fmt::Display for AddJobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddJobError::InvalidPid => f.write_str("Tried to add a job with an invalid pid"),
            AddJobError::TooManyJobs => f.write_str("Tried to create too many jobs"),
        }
    }
}

impl std::error::Error for AddJobError {}

pub struct JobTable {
    slots: Box<[Option<Job>]>,
    next_id: u32,
}

impl Default for JobTable {
    fn default() -> Self {
        Self::new()
    }
}

impl JobTable {
    pub fn new() -> Self {
        Self::with_capacity(MAX_JOBS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        JobTable {
            slots: vec![None; capacity].into_boxed_slice(),
            next_id: 1,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Admit a new job into the first free slot.
    /// On failure the table is unchanged.
    pub fn add(
        &mut self,
        pid: libc::pid_t,
        state: JobState,
        command_line: &str,
    ) -> Result<JobId, AddJobError> {
        let pid = Pid::new(pid).ok_or(AddJobError::InvalidPid)?;
        let Some(slot) = self.slots.iter().position(Option::is_none) else {
            FLOG!(exec_job_status, "Table full, not tracking pid", pid);
            return Err(AddJobError::TooManyJobs);
        };
        if state == JobState::Foreground {
            self.demote_foreground();
        }
        let job_id = self.allocate_id();
        FLOG!(exec_job_status, "Added job", job_id, "pid", pid, "in slot", slot);
        self.slots[slot] = Some(Job {
            pid,
            job_id,
            state,
            command_line: command_line.to_owned(),
        });
        Ok(job_id)
    }

    /// Hand out the next id, wrapping past [`MAX_JOB_ID`] and skipping ids that are still live.
    fn allocate_id(&mut self) -> JobId {
        loop {
            if self.next_id > MAX_JOB_ID {
                self.next_id = 1;
            }
            let candidate = self.next_id;
            self.next_id += 1;
            if self.iter().any(|job| job.job_id.get() == candidate) {
                continue;
            }
            if let Some(id) = NonZeroU32::new(candidate) {
                return JobId(id);
            }
        }
    }

    /// Remove the job whose group leader is `pid`. Return false, changing nothing, if there is none.
    pub fn remove(&mut self, pid: libc::pid_t) -> bool {
        let Some(slot) = self.slot_of_pid(pid) else {
            return false;
        };
        if let Some(job) = self.slots[slot].take() {
            FLOG!(exec_job_status, "Removed job", job.job_id, "pid", job.pid);
        }
        self.next_id = self.max_job_id() + 1;
        true
    }

    /// The largest job id currently in use, or 0.
    pub fn max_job_id(&self) -> u32 {
        self.iter().map(|job| job.job_id.get()).max().unwrap_or(0)
    }

    fn slot_of_pid(&self, pid: libc::pid_t) -> Option<usize> {
        let pid = Pid::new(pid)?;
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|job| job.pid == pid))
    }

    pub fn find_by_pid(&self, pid: libc::pid_t) -> Option<&Job> {
        let slot = self.slot_of_pid(pid)?;
        self.slots[slot].as_ref()
    }

    pub fn find_by_job_id(&self, id: i64) -> Option<&Job> {
        let id = JobId::new(id)?;
        self.iter().find(|job| job.job_id == id)
    }

    /// The foreground job, if any.
    pub fn foreground(&self) -> Option<&Job> {
        self.iter().find(|job| job.is_foreground())
    }

    /// The pid of the foreground job, or 0 if there is none.
    pub fn foreground_pid(&self) -> libc::pid_t {
        self.foreground().map_or(0, |job| job.pid.get())
    }

    /// Move the job led by `pid` to `state`. Making a job the foreground job moves any previous
    /// foreground job to the background. Return false if there is no such job.
    pub fn set_state(&mut self, pid: libc::pid_t, state: JobState) -> bool {
        let Some(slot) = self.slot_of_pid(pid) else {
            return false;
        };
        if state == JobState::Foreground {
            self.demote_foreground();
        }
        if let Some(job) = self.slots[slot].as_mut() {
            FLOG!(
                exec_job_status,
                "Job",
                job.job_id,
                format!("{:?} -> {:?}", job.state, state)
            );
            job.state = state;
        }
        true
    }

    fn demote_foreground(&mut self) {
        for job in self.iter_mut().filter(|job| job.is_foreground()) {
            FLOG!(warning, "Moving previous foreground job", job.job_id, "to the background");
            job.state = JobState::Background;
        }
    }

    /// The jobs in table order. Each call starts a fresh pass, and the returned iterator can be
    /// cloned to walk the same jobs again.
    pub fn list(&self) -> impl Iterator<Item = &Job> + Clone + '_ {
        self.slots.iter().filter_map(Option::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> + Clone + '_ {
        self.list()
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut Job> + '_ {
        self.slots.iter_mut().filter_map(Option::as_mut)
    }

    pub fn stopped_jobs(&self) -> impl Iterator<Item = &Job> + '_ {
        self.iter().filter(|job| job.is_stopped())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_wraps_and_skips_live_ids() {
        let mut jobs = JobTable::with_capacity(4);
        jobs.add(100, JobState::Background, "a &").unwrap();
        jobs.next_id = MAX_JOB_ID;
        assert_eq!(
            jobs.add(101, JobState::Background, "b &").unwrap().get(),
            MAX_JOB_ID
        );
        // Id 1 is still held by the first job.
        assert_eq!(jobs.add(102, JobState::Background, "c &").unwrap().get(), 2);
    }
}

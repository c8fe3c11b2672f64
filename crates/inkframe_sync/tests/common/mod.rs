//! Scripted authority and a tiny in-process network for replica tests.
#![allow(dead_code)]

use inkframe_core::frame::NoWrap;
use inkframe_core::TextFrame;
use inkframe_sync::{LocalCommand, Message, Reconciler};
use std::collections::VecDeque;

pub const DOC: &str = "doc1";

/// Where an authority message goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    To(String),
    AllBut(String),
    All,
}

/// Minimal authority: owns the true text and version, serializes edits and
/// hands the lock around.
pub struct Authority {
    pub text: TextFrame,
    pub version: u64,
    pub owner: Option<String>,
    pub waiting: VecDeque<String>,
    pub snarf: String,
    pub rejected: usize,
}

impl Authority {
    pub fn new(text: &str, version: u64) -> Self {
        Self {
            text: TextFrame::with_text(text, Box::new(NoWrap)),
            version,
            owner: None,
            waiting: VecDeque::new(),
            snarf: String::new(),
            rejected: 0,
        }
    }

    fn out(&self, vers: u64, args: Vec<String>) -> Message {
        Message::new(DOC, "", vers, args)
    }

    /// Full snapshot for `to`.
    pub fn update(&self, to: &str) -> Vec<(Route, Message)> {
        let route = || Route::To(to.to_string());
        let mut out = vec![
            (route(), self.out(0, vec!["edits".into()])),
            (route(), self.out(0, vec!["reload".into()])),
        ];
        let text = self.text.text();
        let mut lines: Vec<&str> = text.split('\n').collect();
        if lines.last() == Some(&"") {
            lines.pop();
        }
        for line in lines {
            out.push((route(), self.out(0, vec!["reloading".into(), line.into()])));
        }
        out.push((
            route(),
            self.out(0, vec!["reloaded".into(), self.version.to_string()]),
        ));
        out
    }

    fn wrong_version(&mut self, vers: u64) -> bool {
        if vers == self.version + 1 {
            return false;
        }
        self.rejected += 1;
        true
    }

    pub fn handle(&mut self, msg: &Message) -> Vec<(Route, Message)> {
        let src = msg.src.clone();
        let Ok(cmd) = LocalCommand::parse(&msg.args) else {
            return Vec::new();
        };
        match cmd {
            LocalCommand::Id | LocalCommand::NeedReload => self.update(&src),
            LocalCommand::Hold => match self.owner.clone() {
                None => {
                    self.owner = Some(src.clone());
                    vec![(Route::To(src), self.out(0, vec!["held".into()]))]
                }
                Some(owner) if owner == src => Vec::new(),
                Some(owner) => {
                    self.waiting.push_back(src);
                    vec![(Route::To(owner), self.out(0, vec!["rlse".into()]))]
                }
            },
            LocalCommand::Rlsed => {
                if self.owner.as_deref() != Some(src.as_str()) {
                    return Vec::new();
                }
                self.owner = self.waiting.pop_front();
                match self.owner.clone() {
                    Some(next) => vec![(Route::To(next), self.out(0, vec!["held".into()]))],
                    None => Vec::new(),
                }
            }
            LocalCommand::Insert { text, pos } => {
                if self.wrong_version(msg.vers) {
                    return self.update(&src);
                }
                if self.text.insert_at(&text, pos).is_err() {
                    return Vec::new();
                }
                self.version += 1;
                vec![(Route::AllBut(src), msg.clone())]
            }
            LocalCommand::Delete { p0, p1 } => {
                if self.wrong_version(msg.vers) {
                    return self.update(&src);
                }
                let _ = self.text.delete_range(p0, p1);
                self.version += 1;
                vec![(Route::AllBut(src), msg.clone())]
            }
            LocalCommand::Cut { p0, p1 } => {
                if self.wrong_version(msg.vers + 1) {
                    return self.update(&src);
                }
                self.snarf = self.text.get(p0, p1);
                let _ = self.text.delete_range(p0, p1);
                self.version += 1;
                let mut fwd = msg.clone();
                fwd.vers = self.version;
                fwd.args[0] = "edel".into();
                vec![(Route::AllBut(src), fwd)]
            }
            LocalCommand::Paste { p0, .. } => {
                if self.wrong_version(msg.vers + 1) {
                    return self.update(&src);
                }
                let snarf = self.snarf.clone();
                if self.text.insert_at(&snarf, p0).is_err() {
                    return Vec::new();
                }
                self.version += 1;
                vec![(
                    Route::All,
                    self.out(self.version, vec!["eins".into(), snarf, p0.to_string()]),
                )]
            }
            LocalCommand::Copy { p0, p1 } => {
                self.snarf = self.text.get(p0, p1);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }
}

/// Authority plus replicas, with synchronous delivery.
pub struct Net {
    pub authority: Authority,
    pub replicas: Vec<Reconciler>,
    /// Deliveries to drop per replica id, to simulate lost messages.
    pub drop_next: Vec<String>,
    pub delivered: usize,
}

impl Net {
    pub fn new(text: &str, version: u64, ids: &[&str]) -> Self {
        let replicas = ids
            .iter()
            .map(|id| {
                let mut r = Reconciler::new(DOC, *id, TextFrame::new(Box::new(NoWrap)));
                r.connect();
                r
            })
            .collect();
        let mut net = Self {
            authority: Authority::new(text, version),
            replicas,
            drop_next: Vec::new(),
            delivered: 0,
        };
        net.pump();
        net
    }

    pub fn replica(&mut self, id: &str) -> &mut Reconciler {
        self.replicas
            .iter_mut()
            .find(|r| r.replica_id() == id)
            .expect("replica")
    }

    fn deliver(&mut self, deliveries: Vec<(Route, Message)>) {
        for (route, msg) in deliveries {
            for i in 0..self.replicas.len() {
                let id = self.replicas[i].replica_id().to_string();
                let wanted = match &route {
                    Route::To(to) => *to == id,
                    Route::AllBut(src) => *src != id,
                    Route::All => true,
                };
                if !wanted {
                    continue;
                }
                if let Some(at) = self.drop_next.iter().position(|d| *d == id) {
                    self.drop_next.remove(at);
                    continue;
                }
                self.delivered += 1;
                self.replicas[i].apply(&msg);
            }
        }
    }

    /// Route every pending replica message until the network is quiet.
    pub fn pump(&mut self) {
        loop {
            let mut moved = false;
            for i in 0..self.replicas.len() {
                let out = self.replicas[i].drain_outbox();
                for msg in out {
                    moved = true;
                    let deliveries = self.authority.handle(&msg);
                    self.deliver(deliveries);
                }
            }
            if !moved {
                break;
            }
        }
    }

    /// True when every replica matches the authority's text and version.
    pub fn converged(&self) -> bool {
        let text = self.authority.text.text();
        self.replicas
            .iter()
            .all(|r| r.frame().text() == text && r.version() == self.authority.version)
    }
}

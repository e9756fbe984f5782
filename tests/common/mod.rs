#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

use component_migrate::commands::migrate::RunPlan;
use component_migrate::engine::Pacer;
use component_migrate::error::{MigrateError, Result};
use component_migrate::model::Item;
use component_migrate::remote::{Directory, classify};

/// In-memory stand-in for the remote service.
#[derive(Default)]
pub struct FakeDirectory {
    projects: RefCell<HashMap<String, Vec<Item>>>,
    next_id: RefCell<u64>,
    pub creates: RefCell<Vec<(String, String)>>,
    /// name -> (status, body) returned instead of creating.
    pub rejections: HashMap<String, (u16, String)>,
    /// Projects whose listing fails with a 503.
    pub failing_lists: Vec<String>,
    /// 1-based `list` call that fails with a 503, counted across all projects.
    pub failing_list_call: Option<usize>,
    lists: RefCell<usize>,
    /// Extra components another writer adds to the destination on each create.
    pub concurrent_writes: usize,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self {
            next_id: RefCell::new(10_000),
            ..Default::default()
        }
    }

    pub fn with_project(self, key: &str, components: &[(&str, &str)]) -> Self {
        let items = components
            .iter()
            .map(|(id, name)| Item::new(*id, *name, Some(format!("{name} component"))))
            .collect();
        self.projects.borrow_mut().insert(key.to_string(), items);
        self
    }

    pub fn reject(mut self, name: &str, status: u16, body: &str) -> Self {
        self.rejections
            .insert(name.to_string(), (status, body.to_string()));
        self
    }

    pub fn names(&self, key: &str) -> Vec<String> {
        self.projects.borrow()[key]
            .iter()
            .map(|item| item.name.clone())
            .collect()
    }

    fn allocate_id(&self) -> String {
        let mut next = self.next_id.borrow_mut();
        *next += 1;
        next.to_string()
    }
}

impl Directory for FakeDirectory {
    fn project_exists(&self, project: &str) -> Result<()> {
        if self.projects.borrow().contains_key(project) {
            Ok(())
        } else {
            Err(classify(
                404,
                &format!(r#"{{"errorMessages":["No project could be found with key '{project}'."]}}"#),
            ))
        }
    }

    fn list(&self, project: &str) -> Result<Vec<Item>> {
        let call = {
            let mut lists = self.lists.borrow_mut();
            *lists += 1;
            *lists
        };
        if self.failing_list_call == Some(call) || self.failing_lists.iter().any(|p| p == project) {
            return Err(MigrateError::Transport {
                status: Some(503),
                message: "HTTP 503".into(),
            });
        }
        self.project_exists(project)?;
        Ok(self.projects.borrow()[project].clone())
    }

    fn create(&self, project: &str, name: &str, description: Option<&str>) -> Result<Item> {
        self.creates
            .borrow_mut()
            .push((project.to_string(), name.to_string()));
        if let Some((status, body)) = self.rejections.get(name) {
            return Err(classify(*status, body));
        }
        let item = Item::new(self.allocate_id(), name, description.map(str::to_string));
        let mut projects = self.projects.borrow_mut();
        let dest = projects
            .get_mut(project)
            .ok_or_else(|| classify(404, ""))?;
        dest.push(item.clone());
        for _ in 0..self.concurrent_writes {
            let id = self.allocate_id();
            dest.push(Item::new(id.clone(), format!("external-{id}"), None));
        }
        Ok(item)
    }
}

/// Records pauses instead of sleeping.
#[derive(Default)]
pub struct RecordingPacer(pub Vec<Duration>);

impl Pacer for RecordingPacer {
    fn pause(&mut self, delay: Duration) {
        self.0.push(delay);
    }
}

pub fn plan(output_dir: &std::path::Path, run_id: &str, dry_run: bool) -> RunPlan {
    RunPlan {
        run_id: run_id.to_string(),
        url: "https://jira.example.com/rest/api/2".into(),
        source: "SRC".into(),
        dest: "DST".into(),
        output_dir: output_dir.to_path_buf(),
        delay_ms: 100,
        dry_run,
        backup: true,
    }
}

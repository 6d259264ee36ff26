// ABOUTME: Runs the four reclamation steps for one PR.
// ABOUTME: A failing step is recorded in the report and never stops the next one.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use futures::future::join_all;

use super::processes::{ProcessError, ProcessOps};
use super::report::{TeardownReport, TeardownStep, TerminatedProcess};
use crate::build::ImageOps;
use crate::cluster::NamespaceOps;
use crate::ports::PortAllocator;
use crate::state_files;
use crate::types::{NamespaceName, PrNumber};

#[derive(Debug, Clone)]
pub struct TeardownCoordinator {
    registry_namespace: String,
    state_dir: PathBuf,
    ports: PortAllocator,
}

impl TeardownCoordinator {
    pub fn new(
        registry_namespace: impl Into<String>,
        state_dir: impl Into<PathBuf>,
        ports: PortAllocator,
    ) -> Self {
        Self {
            registry_namespace: registry_namespace.into(),
            state_dir: state_dir.into(),
            ports,
        }
    }

    /// Remove everything belonging to `pr`. Failures end up in the report.
    ///
    /// Only namespaces named exactly `pr-{n}` or `pr-{n}-{k}` are deleted.
    /// A namespace that merely contains the name, such as `foo-pr-42`, is
    /// left alone.
    pub async fn teardown<C, I, P>(
        &self,
        cluster: &C,
        images: &I,
        processes: &P,
        pr: PrNumber,
    ) -> TeardownReport
    where
        C: NamespaceOps + ?Sized,
        I: ImageOps + ?Sized,
        P: ProcessOps + ?Sized,
    {
        tracing::info!(pr = %pr, "tearing down previews");
        let mut report = TeardownReport::new(pr);

        self.remove_namespaces(cluster, pr, &mut report).await;
        self.remove_images(images, pr, &mut report).await;
        self.stop_processes(processes, pr, &mut report).await;
        self.remove_files(pr, &mut report);

        tracing::info!(
            pr = %pr,
            status = ?report.status,
            namespaces = report.namespaces.len(),
            images = report.images.len(),
            processes = report.processes.len(),
            files = report.files.len(),
            "teardown finished"
        );
        report
    }

    async fn remove_namespaces<C: NamespaceOps + ?Sized>(
        &self,
        cluster: &C,
        pr: PrNumber,
        report: &mut TeardownReport,
    ) {
        let names = match cluster.list_namespaces().await {
            Ok(names) => names,
            Err(e) => {
                report.fail(TeardownStep::Namespaces, "namespace list", e);
                return;
            }
        };

        for name in names
            .into_iter()
            .filter(|name| NamespaceName::matches_pr(name, pr))
        {
            match cluster.delete_namespace(&name).await {
                Ok(()) => report.namespaces.push(name),
                Err(e) => report.fail(TeardownStep::Namespaces, name, e),
            }
        }
    }

    async fn remove_images<I: ImageOps + ?Sized>(
        &self,
        images: &I,
        pr: PrNumber,
        report: &mut TeardownReport,
    ) {
        let prefix = format!("{}/", self.registry_namespace);
        let found = match images.list_images(&prefix).await {
            Ok(found) => found,
            Err(e) => {
                report.fail(TeardownStep::Images, "image list", e);
                return;
            }
        };

        let tag = pr.tag();
        for image in found
            .into_iter()
            .filter(|image| image.repository().starts_with(&prefix) && image.tag() == tag)
        {
            match images.remove_image(&image).await {
                Ok(()) => report.images.push(image.to_string()),
                Err(e) => report.fail(TeardownStep::Images, image.to_string(), e),
            }
        }
    }

    async fn stop_processes<P: ProcessOps + ?Sized>(
        &self,
        processes: &P,
        pr: PrNumber,
        report: &mut TeardownReport,
    ) {
        let files = match state_files::files_for_pr(&self.state_dir, pr) {
            Ok(files) => files,
            Err(e) => {
                report.fail(TeardownStep::Processes, self.state_dir.display().to_string(), e);
                Vec::new()
            }
        };

        // pid -> port it was found on, if any
        let mut targets: BTreeMap<u32, Option<u16>> = BTreeMap::new();
        let mut ports: BTreeSet<u16> = self.ports.deterministic_ports(pr);

        for (_, record) in state_files::read_records(&files) {
            targets.entry(record.pid).or_insert(record.local_port);
            ports.extend(record.local_port);
        }

        let lookups = join_all(ports.iter().map(|port| processes.listening_pids(*port))).await;
        for (port, lookup) in ports.iter().zip(lookups) {
            match lookup {
                Ok(pids) => {
                    for pid in pids {
                        targets.insert(pid, Some(*port));
                    }
                }
                Err(e) => report.fail(TeardownStep::Processes, format!("port {port}"), e),
            }
        }

        let own_pid = std::process::id();
        for (pid, port) in targets {
            if pid == own_pid {
                continue;
            }
            match processes.terminate(pid).await {
                Ok(()) => report.processes.push(TerminatedProcess { pid, port }),
                Err(ProcessError::NotRunning(_)) => {
                    tracing::debug!(pid, "recorded process already gone");
                }
                Err(e) => report.fail(TeardownStep::Processes, format!("pid {pid}"), e),
            }
        }
    }

    fn remove_files(&self, pr: PrNumber, report: &mut TeardownReport) {
        let files = match state_files::files_for_pr(&self.state_dir, pr) {
            Ok(files) => files,
            Err(e) => {
                report.fail(TeardownStep::Files, self.state_dir.display().to_string(), e);
                return;
            }
        };

        for path in files {
            match std::fs::remove_file(&path) {
                Ok(()) => report.files.push(path),
                Err(e) => report.fail(TeardownStep::Files, path.display().to_string(), e),
            }
        }
    }
}

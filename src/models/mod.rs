//! Data models for the depot ledger.

mod missort;
mod parcel;
mod registry;
mod report;

pub use missort::{CageAuditMissort, NewCageAuditMissort};
pub use parcel::{today, NewParcelEntry, ParcelPatch, ParcelScanEntry, ScanType, BARCODE_LEN};
pub use registry::{
    Client, Courier, DeliveryUnit, RegistryImport, RegistrySnapshot, Round, SubDepot, TeamMember,
};
pub use report::{
    report_key, CageReturnLine, CageReturnReport, CageReturnSheet, ClientMissortCount,
    DailyMissortSummaryReport, DucFinalReport, DucReportDraft, FailedRound, MissingParcelsSummary,
    MissortSummary, RoundCourierPair, RoundMissortCount, SegregatedParcel, Submitter,
};

//! Panel widgets

pub mod console_view;
pub mod feature_list;
pub mod options_form;
pub mod status_bar;
pub mod task_board;

pub use console_view::ConsoleView;
pub use feature_list::{FeatureItem, FeatureList, FeatureListState};
pub use options_form::{OptionsFormState, OptionsFormView};
pub use status_bar::{HintMode, StatusBar, StatusBarState};
pub use task_board::{TaskBoard, TaskBoardState};

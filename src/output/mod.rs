pub mod dashboard;
pub mod formatter;
pub mod records;

pub use dashboard::format_dashboard;
pub use formatter::{
    format_age, format_breakdown, format_composite, format_json, format_point_diff, format_record,
    format_spirit, format_standings, format_tsv, should_use_colors, truncate,
};
pub use records::{
    format_attendance, format_child_list, format_match_detail, format_match_list,
    format_player_list, format_session_list, format_team_list, format_tournament_list,
};

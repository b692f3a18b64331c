//! Swedish UI strings for the table controls and the map tooltip.
//! One language, fixed at build time.

pub struct Strings {
    pub title: &'static str,
    pub search: &'static str,
    pub length_menu: &'static str,
    pub info: &'static str,
    pub info_empty: &'static str,
    pub info_filtered: &'static str,
    pub zero_records: &'static str,
    pub paginate_first: &'static str,
    pub paginate_previous: &'static str,
    pub paginate_next: &'static str,
    pub paginate_last: &'static str,
    pub sort_ascending: &'static str,
    pub sort_descending: &'static str,
    pub column_name: &'static str,
    pub column_score: &'static str,
    pub tooltip_score_prefix: &'static str,
    pub score_unknown: &'static str,
    pub empty_map: &'static str,
    pub bad_site_url: &'static str,
}

pub const SV: Strings = Strings {
    title: "Kommuner",
    search: "Sök:",
    length_menu: "Visa _MENU_ kommuner",
    info: "Visar _START_ till _END_ av _TOTAL_ kommuner",
    info_empty: "Visar 0 till 0 av 0 kommuner",
    info_filtered: "(filtrerat från totalt _MAX_ kommuner)",
    zero_records: "Inga matchande kommuner hittades",
    paginate_first: "Första",
    paginate_previous: "Föregående",
    paginate_next: "Nästa",
    paginate_last: "Sista",
    sort_ascending: "aktivera för att sortera ökande",
    sort_descending: "aktivera för att sortera minskande",
    column_name: "Kommun",
    column_score: "Betyg",
    tooltip_score_prefix: "Betyg: ",
    score_unknown: "–",
    empty_map: "Ingen kartdata tillgänglig",
    bad_site_url: "Ingen giltig webbadress för kommunen",
};

impl Strings {
    /// The "Visar X till Y av Z kommuner" line. `filtered_from` carries the
    /// unfiltered total when a search is active.
    pub fn info_line(
        &self,
        start: usize,
        end: usize,
        total: usize,
        filtered_from: Option<usize>,
    ) -> String {
        let mut line = if total == 0 {
            self.info_empty.to_string()
        } else {
            self.info
                .replace("_START_", &start.to_string())
                .replace("_END_", &end.to_string())
                .replace("_TOTAL_", &total.to_string())
        };
        if let Some(max) = filtered_from {
            line.push(' ');
            line.push_str(&self.info_filtered.replace("_MAX_", &max.to_string()));
        }
        line
    }

    pub fn length_menu_label(&self, menu: &str) -> String {
        self.length_menu.replace("_MENU_", menu)
    }
}

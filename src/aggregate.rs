// src/aggregate.rs
//
// Pure transformations from upstream records to summary rows. Grouping is exact,
// case-sensitive string equality; free text is never normalized. Callers must
// not rely on row order.

use std::collections::BTreeMap;

use crate::models::{
    AppointmentRecord, AppointmentsOverTime, AppointmentsPerDoctor, PatientRecord,
    SymptomsBySpecialty,
};

/// Placeholder display name. The upstream doctor name is not used.
pub fn doctor_display_name(doctor_id: &str) -> String {
    format!("Doctor_{doctor_id}")
}

pub fn appointments_per_doctor(appointments: &[AppointmentRecord]) -> Vec<AppointmentsPerDoctor> {
    tracing::info!("Aggregating appointments per doctor...");

    let mut counts: BTreeMap<&str, i64> = BTreeMap::new();
    for a in appointments {
        *counts.entry(a.doctor_id.as_str()).or_default() += 1;
    }

    counts
        .into_iter()
        .map(|(doctor_id, appointment_count)| AppointmentsPerDoctor {
            doctor_id: doctor_id.to_string(),
            doctor_name: doctor_display_name(doctor_id),
            appointment_count,
        })
        .collect()
}

pub fn appointments_over_time(appointments: &[AppointmentRecord]) -> Vec<AppointmentsOverTime> {
    tracing::info!("Aggregating appointments over time...");

    let mut counts = BTreeMap::new();
    for a in appointments {
        *counts.entry(a.appointment_date.date()).or_insert(0i64) += 1;
    }

    counts
        .into_iter()
        .map(|(day, appointment_count)| AppointmentsOverTime {
            period: day.format("%Y-%m-%d").to_string(),
            appointment_count,
        })
        .collect()
}

/// Groups medical-history entries by patient gender. One count per entry, so
/// repeated entries for the same patient count repeatedly.
pub fn symptoms_by_specialty(patients: &[PatientRecord]) -> Vec<SymptomsBySpecialty> {
    tracing::info!("Aggregating symptoms by specialty...");

    let mut counts: BTreeMap<(&str, &str), i64> = BTreeMap::new();
    for p in patients {
        for symptom in &p.medical_history {
            *counts.entry((p.gender.as_str(), symptom.as_str())).or_default() += 1;
        }
    }

    counts
        .into_iter()
        .map(|((specialty, symptom), occurrence_count)| SymptomsBySpecialty {
            specialty: specialty.to_string(),
            symptom: symptom.to_string(),
            occurrence_count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::parse_timestamp;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn appt(doctor_id: &str, date: &str) -> AppointmentRecord {
        AppointmentRecord {
            doctor_id: doctor_id.to_string(),
            appointment_date: parse_timestamp(date).unwrap(),
            ..Default::default()
        }
    }

    fn patient(gender: &str, history: &[&str]) -> PatientRecord {
        PatientRecord {
            gender: gender.to_string(),
            medical_history: history.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn sample_appointments() -> Vec<AppointmentRecord> {
        vec![
            appt("d1", "2024-01-01T10:00"),
            appt("d1", "2024-01-01T14:00"),
            appt("d2", "2024-01-02T09:00"),
        ]
    }

    #[test]
    fn per_doctor_example() {
        let mut rows = appointments_per_doctor(&sample_appointments());
        rows.sort_by(|a, b| a.doctor_id.cmp(&b.doctor_id));
        assert_eq!(
            rows,
            vec![
                AppointmentsPerDoctor {
                    doctor_id: "d1".into(),
                    doctor_name: "Doctor_d1".into(),
                    appointment_count: 2,
                },
                AppointmentsPerDoctor {
                    doctor_id: "d2".into(),
                    doctor_name: "Doctor_d2".into(),
                    appointment_count: 1,
                },
            ]
        );
    }

    #[test]
    fn over_time_example() {
        let mut rows = appointments_over_time(&sample_appointments());
        rows.sort_by(|a, b| a.period.cmp(&b.period));
        assert_eq!(
            rows,
            vec![
                AppointmentsOverTime { period: "2024-01-01".into(), appointment_count: 2 },
                AppointmentsOverTime { period: "2024-01-02".into(), appointment_count: 1 },
            ]
        );
    }

    #[test]
    fn symptoms_example() {
        let patients = vec![patient("F", &["fever", "cough"]), patient("F", &["fever"])];
        let rows: HashSet<_> = symptoms_by_specialty(&patients)
            .into_iter()
            .map(|r| (r.specialty, r.symptom, r.occurrence_count))
            .collect();
        let expected: HashSet<_> = [
            ("F".to_string(), "fever".to_string(), 2),
            ("F".to_string(), "cough".to_string(), 1),
        ]
        .into_iter()
        .collect();
        assert_eq!(rows, expected);
    }

    #[test]
    fn counts_sum_to_inputs() {
        let appointments: Vec<_> = (0..57)
            .map(|i| {
                let doctor = format!("d{}", i % 5);
                let date = format!("2024-03-{:02}T{:02}:15", 1 + i % 9, i % 24);
                appt(&doctor, &date)
            })
            .collect();

        let per_doctor = appointments_per_doctor(&appointments);
        assert_eq!(per_doctor.iter().map(|r| r.appointment_count).sum::<i64>(), 57);
        assert_eq!(per_doctor.len(), 5);

        let over_time = appointments_over_time(&appointments);
        assert_eq!(over_time.iter().map(|r| r.appointment_count).sum::<i64>(), 57);
        let days: HashSet<_> = over_time.iter().map(|r| r.period.as_str()).collect();
        assert_eq!(days.len(), over_time.len());
        assert_eq!(over_time.len(), 9);

        let patients = vec![
            patient("M", &["headache", "fever", "headache"]),
            patient("F", &[]),
            patient("f", &["fever"]),
            patient("", &["nausea"]),
        ];
        let symptoms = symptoms_by_specialty(&patients);
        assert_eq!(symptoms.iter().map(|r| r.occurrence_count).sum::<i64>(), 5);
        assert!(symptoms.iter().all(|r| r.occurrence_count > 0));
    }

    #[test]
    fn grouping_is_case_sensitive() {
        let patients = vec![patient("F", &["Fever"]), patient("f", &["fever"])];
        assert_eq!(symptoms_by_specialty(&patients).len(), 2);

        let appointments = vec![appt("D1", "2024-01-01"), appt("d1", "2024-01-01")];
        assert_eq!(appointments_per_doctor(&appointments).len(), 2);
    }

    #[test]
    fn time_of_day_is_discarded() {
        let appointments = vec![
            appt("d1", "2024-05-05T00:00"),
            appt("d2", "2024-05-05T23:59:59"),
        ];
        let rows = appointments_over_time(&appointments);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].period, "2024-05-05");
        assert_eq!(rows[0].appointment_count, 2);
    }

    #[test]
    fn empty_inputs_give_empty_views() {
        assert!(appointments_per_doctor(&[]).is_empty());
        assert!(appointments_over_time(&[]).is_empty());
        assert!(symptoms_by_specialty(&[]).is_empty());
        assert!(symptoms_by_specialty(&[patient("F", &[])]).is_empty());
    }

    #[test]
    fn aggregation_is_deterministic() {
        let a = sample_appointments();
        assert_eq!(appointments_per_doctor(&a), appointments_per_doctor(&a));
        assert_eq!(appointments_over_time(&a), appointments_over_time(&a));
    }
}

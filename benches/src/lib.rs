//! Бенчмарки iqseg: конвертация выборок и нарезка блоков (см. `benches/`).
